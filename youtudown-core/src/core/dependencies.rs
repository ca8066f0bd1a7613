use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::core::locator::{Locator, Probe};
use crate::core::process::ProcessLauncher;
use crate::models::progress::OutputStream;

pub const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DependencyStatus {
    pub name: String,
    pub installed: bool,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

fn version_flag_for(tool: &str) -> &'static str {
    match tool {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}

/// Pull the version out of the first line the tool printed.
pub fn parse_version(tool: &str, first_line: &str) -> Option<String> {
    let line = first_line.trim();
    if line.is_empty() {
        return None;
    }
    match tool {
        // "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) ..."
        "ffmpeg" | "ffprobe" => line.split_whitespace().nth(2).map(|s| s.to_string()),
        _ => Some(line.to_string()),
    }
}

/// Run the version flag of an already located tool.
pub async fn probe_version(
    launcher: &dyn ProcessLauncher,
    tool: &str,
    path: &Path,
    timeout: Duration,
) -> Option<String> {
    let _timer_start = std::time::Instant::now();
    let cancel = CancellationToken::new();
    let handle = launcher
        .launch(path, &[version_flag_for(tool).to_string()], cancel.clone())
        .await;

    let (lines, outcome) = match tokio::time::timeout(timeout, handle.collect()).await {
        Ok(done) => done,
        Err(_) => {
            cancel.cancel();
            tracing::warn!("{} {} timed out", tool, version_flag_for(tool));
            return None;
        }
    };

    if !outcome.is_success() {
        tracing::debug!("[perf] probe_version({}) took {:?}", tool, _timer_start.elapsed());
        return None;
    }

    let version = lines
        .iter()
        .find(|l| l.stream == OutputStream::Stdout)
        .and_then(|l| parse_version(tool, &l.text));
    tracing::debug!("[perf] probe_version({}) took {:?}", tool, _timer_start.elapsed());
    version
}

/// Locate a tool and ask it for its version. Never fails; a missing or
/// broken tool is reported as not installed.
pub async fn check_dependency<P: Probe>(
    launcher: &dyn ProcessLauncher,
    locator: &Locator<P>,
) -> DependencyStatus {
    let name = locator.tool().to_string();
    let path = match locator.locate() {
        Ok(path) => path,
        Err(_) => {
            return DependencyStatus {
                name,
                installed: false,
                version: None,
                path: None,
            }
        }
    };

    let version = probe_version(launcher, &name, &path, VERSION_TIMEOUT).await;
    DependencyStatus {
        installed: version.is_some(),
        name,
        version,
        path: Some(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process::fake::ScriptedLauncher;
    use crate::models::progress::ExecutionOutcome;
    use std::ffi::OsString;

    struct OnlyAt(PathBuf);

    impl Probe for OnlyAt {
        fn is_executable(&self, path: &Path) -> bool {
            path == self.0
        }

        fn search_path(&self) -> Option<OsString> {
            self.0.parent().map(|p| p.as_os_str().to_os_string())
        }

        fn current_exe(&self) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn parses_versions() {
        assert_eq!(
            parse_version("ffmpeg", "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023"),
            Some("6.1.1-3ubuntu5".into())
        );
        assert_eq!(parse_version("yt-dlp", "2024.08.06\n"), Some("2024.08.06".into()));
        assert_eq!(parse_version("yt-dlp", "  "), None);
        assert_eq!(parse_version("ffmpeg", "ffmpeg"), None);
    }

    #[tokio::test]
    async fn installed_tool_reports_version_and_path() {
        let launcher = ScriptedLauncher::stdout(&["2024.08.06"]);
        let locator = Locator::for_tool(
            "yt-dlp",
            vec!["yt-dlp".into()],
            None,
            OnlyAt(PathBuf::from("/usr/bin/yt-dlp")),
        )
        .with_install_dirs(vec![]);

        let status = check_dependency(&launcher, &locator).await;
        assert!(status.installed);
        assert_eq!(status.version.as_deref(), Some("2024.08.06"));
        assert_eq!(status.path, Some(PathBuf::from("/usr/bin/yt-dlp")));
        assert_eq!(launcher.last_args(), ["--version"]);
    }

    #[tokio::test]
    async fn ffmpeg_uses_single_dash_flag() {
        let launcher = ScriptedLauncher::stdout(&["ffmpeg version 7.0 Copyright"]);
        let locator = Locator::for_tool(
            "ffmpeg",
            vec!["ffmpeg".into()],
            None,
            OnlyAt(PathBuf::from("/usr/bin/ffmpeg")),
        )
        .with_install_dirs(vec![]);

        let status = check_dependency(&launcher, &locator).await;
        assert_eq!(status.version.as_deref(), Some("7.0"));
        assert_eq!(launcher.last_args(), ["-version"]);
    }

    #[tokio::test]
    async fn missing_tool_is_not_installed() {
        let launcher = ScriptedLauncher::stdout(&[]);
        let locator = Locator::for_tool(
            "yt-dlp",
            vec!["yt-dlp".into()],
            None,
            OnlyAt(PathBuf::from("/nowhere/else")),
        )
        .with_install_dirs(vec![]);

        let status = check_dependency(&launcher, &locator).await;
        assert!(!status.installed);
        assert!(status.path.is_none());
        assert!(launcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn broken_tool_is_not_installed() {
        let launcher = ScriptedLauncher::new(
            vec![],
            ExecutionOutcome::Failed {
                exit_code: Some(127),
                stderr: "python3: not found".into(),
            },
        );
        let locator = Locator::for_tool(
            "yt-dlp",
            vec!["yt-dlp".into()],
            None,
            OnlyAt(PathBuf::from("/usr/bin/yt-dlp")),
        )
        .with_install_dirs(vec![]);

        let status = check_dependency(&launcher, &locator).await;
        assert!(!status.installed);
        assert_eq!(status.path, Some(PathBuf::from("/usr/bin/yt-dlp")));
    }

    #[tokio::test]
    async fn stalled_version_probe_gives_up() {
        let launcher = ScriptedLauncher::hanging(vec![]);
        let version = probe_version(
            &launcher,
            "yt-dlp",
            Path::new("/usr/bin/yt-dlp"),
            Duration::from_millis(50),
        )
        .await;
        assert!(version.is_none());
    }
}
