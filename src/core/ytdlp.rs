use std::path::PathBuf;
use std::sync::Arc;

use youtudown_core::core::locator::{verify_configured, HostProbe, Locator};
use youtudown_core::core::process::{ProcessLauncher, TokioLauncher};
use youtudown_core::fs_paths::AppPaths;
use youtudown_core::models::settings::AppSettings;
use youtudown_core::YtdlpResult;

/// The configured binary when one is set, otherwise the first one the
/// locator finds.
pub fn find_ytdlp(settings: &AppSettings, paths: &dyn AppPaths) -> YtdlpResult<PathBuf> {
    match settings.advanced.ytdlp_path.as_deref() {
        Some(path) if !path.as_os_str().is_empty() => {
            verify_configured("yt-dlp", path, &HostProbe)
        }
        _ => Locator::ytdlp(paths.bin_dir()).locate(),
    }
}

pub fn launcher(paths: &dyn AppPaths) -> Arc<dyn ProcessLauncher> {
    Arc::new(TokioLauncher::new(paths.bin_dir()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use youtudown_core::fs_paths::FixedPaths;
    use youtudown_core::YtdlpError;

    #[test]
    fn configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("my-yt-dlp");
        std::fs::write(&bin, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut settings = AppSettings::default();
        settings.advanced.ytdlp_path = Some(bin.clone());
        let paths = FixedPaths(dir.path().to_path_buf());
        assert_eq!(find_ytdlp(&settings, &paths).unwrap(), bin);
    }

    #[test]
    fn missing_configured_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = AppSettings::default();
        settings.advanced.ytdlp_path = Some(dir.path().join("absent"));
        let paths = FixedPaths(dir.path().to_path_buf());
        assert!(matches!(
            find_ytdlp(&settings, &paths),
            Err(YtdlpError::ExecutableNotFound { .. })
        ));
    }
}
