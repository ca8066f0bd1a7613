use std::path::PathBuf;

use anyhow::Context;
use youtudown_core::fs_paths::AppPaths;
use youtudown_core::models::settings::AppSettings;

const STORE_FILE: &str = "settings.json";

pub fn settings_path(paths: &dyn AppPaths) -> PathBuf {
    paths.data_dir().join(STORE_FILE)
}

/// Missing or unreadable files fall back to the defaults.
pub fn load_settings(paths: &dyn AppPaths) -> AppSettings {
    let path = settings_path(paths);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AppSettings::default(),
        Err(e) => {
            tracing::warn!("could not read {}: {}", path.display(), e);
            return AppSettings::default();
        }
    };

    match serde_json::from_str::<AppSettings>(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("ignoring corrupt settings at {}: {}", path.display(), e);
            AppSettings::default()
        }
    }
}

pub fn save_settings(paths: &dyn AppPaths, settings: &AppSettings) -> anyhow::Result<()> {
    let path = settings_path(paths);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;
    tracing::debug!("saved settings to {}", path.display());
    Ok(())
}
