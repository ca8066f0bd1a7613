//! Finds external tools on the host.
//!
//! Candidates are checked in strict order: every `PATH` entry, then the
//! fixed installation directories (plus the managed bin dir), then the
//! directory of the running binary (sidecar) and its macOS `Resources`
//! sibling. The first existing executable wins.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::{YtdlpError, YtdlpResult};

/// Filesystem and environment reads the locator depends on.
pub trait Probe: Send + Sync {
    fn is_executable(&self, path: &Path) -> bool;
    fn search_path(&self) -> Option<OsString>;
    fn current_exe(&self) -> Option<PathBuf>;
}

pub struct HostProbe;

impl Probe for HostProbe {
    fn is_executable(&self, path: &Path) -> bool {
        let Ok(meta) = std::fs::metadata(path) else {
            return false;
        };
        if !meta.is_file() {
            return false;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode() & 0o111 != 0
        }
        #[cfg(not(unix))]
        {
            true
        }
    }

    fn search_path(&self) -> Option<OsString> {
        std::env::var_os("PATH")
    }

    fn current_exe(&self) -> Option<PathBuf> {
        std::env::current_exe().ok()
    }
}

pub fn ytdlp_names() -> Vec<String> {
    if cfg!(target_os = "windows") {
        vec!["yt-dlp.exe".into(), "yt-dlp_x86.exe".into()]
    } else {
        vec!["yt-dlp".into(), "yt-dlp_linux".into(), "yt-dlp_macos".into()]
    }
}

fn bin_name(tool: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.exe", tool)
    } else {
        tool.to_string()
    }
}

/// Well-known installation directories for the current platform.
pub fn known_install_dirs() -> Vec<PathBuf> {
    let dirs: &[&str] = if cfg!(target_os = "macos") {
        &["/opt/homebrew/bin", "/usr/local/bin"]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin", "/usr/local/bin", "/snap/bin"]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\ProgramData\\chocolatey\\bin",
            "C:\\Program Files\\yt-dlp",
            "C:\\Program Files (x86)\\yt-dlp",
        ]
    } else {
        &[]
    };
    dirs.iter().map(PathBuf::from).collect()
}

pub struct Locator<P: Probe = HostProbe> {
    tool: String,
    names: Vec<String>,
    install_dirs: Vec<PathBuf>,
    probe: P,
}

impl Locator<HostProbe> {
    pub fn ytdlp(managed_bin_dir: Option<PathBuf>) -> Self {
        Self::for_tool("yt-dlp", ytdlp_names(), managed_bin_dir, HostProbe)
    }

    pub fn ffmpeg(managed_bin_dir: Option<PathBuf>) -> Self {
        Self::for_tool("ffmpeg", vec![bin_name("ffmpeg")], managed_bin_dir, HostProbe)
    }
}

impl<P: Probe> Locator<P> {
    pub fn for_tool(
        tool: &str,
        names: Vec<String>,
        managed_bin_dir: Option<PathBuf>,
        probe: P,
    ) -> Self {
        let mut install_dirs = known_install_dirs();
        install_dirs.extend(managed_bin_dir);
        Self {
            tool: tool.to_string(),
            names,
            install_dirs,
            probe,
        }
    }

    /// Replace the fixed installation directories.
    pub fn with_install_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.install_dirs = dirs;
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Every path that would be probed, in priority order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();

        if let Some(path_var) = self.probe.search_path() {
            for dir in std::env::split_paths(&path_var) {
                if dir.as_os_str().is_empty() {
                    continue;
                }
                for name in &self.names {
                    out.push(dir.join(name));
                }
            }
        }

        for dir in &self.install_dirs {
            for name in &self.names {
                out.push(dir.join(name));
            }
        }

        if let Some(exe_dir) = self
            .probe
            .current_exe()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            for name in &self.names {
                out.push(exe_dir.join(name));
            }
            for name in &self.names {
                out.push(exe_dir.join("..").join("Resources").join(name));
            }
        }

        out
    }

    pub fn locate(&self) -> YtdlpResult<PathBuf> {
        let candidates = self.candidates();
        if let Some(found) = candidates.iter().find(|c| self.probe.is_executable(c)) {
            tracing::debug!("located {} at {}", self.tool, found.display());
            return Ok(found.clone());
        }
        tracing::warn!(
            "{} not found after probing {} candidates",
            self.tool,
            candidates.len()
        );
        Err(YtdlpError::ExecutableNotFound {
            tool: self.tool.clone(),
            searched: candidates,
        })
    }
}

/// Check a user-configured path instead of searching.
pub fn verify_configured(tool: &str, path: &Path, probe: &dyn Probe) -> YtdlpResult<PathBuf> {
    if probe.is_executable(path) {
        Ok(path.to_path_buf())
    } else {
        Err(YtdlpError::ExecutableNotFound {
            tool: tool.to_string(),
            searched: vec![path.to_path_buf()],
        })
    }
}
