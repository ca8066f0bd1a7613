use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::request::QualityTier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub anti_detection: AntiDetectionSettings,
    #[serde(default)]
    pub advanced: AdvancedSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSettings {
    #[serde(default)]
    pub default_output_dir: Option<PathBuf>,
    #[serde(default)]
    pub video_quality: QualityTier,
    #[serde(default = "default_filename_template")]
    pub filename_template: String,
    #[serde(default)]
    pub download_subtitles: bool,
    #[serde(default = "default_subtitle_languages")]
    pub subtitle_languages: Vec<String>,
    #[serde(default = "default_subtitle_format")]
    pub subtitle_format: String,
    #[serde(default = "default_merge_output_format")]
    pub merge_output_format: Option<String>,
    #[serde(default)]
    pub extra_ytdlp_flags: Vec<String>,
}

/// Flags passed straight to yt-dlp to look less like a script. Evasion
/// itself is yt-dlp's business; these are only forwarded when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AntiDetectionSettings {
    #[serde(default)]
    pub impersonate: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub cookies_from_browser: Option<String>,
    #[serde(default)]
    pub sleep_requests: Option<f64>,
    #[serde(default)]
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedSettings {
    #[serde(default = "default_info_timeout_secs")]
    pub info_timeout_secs: u64,
    /// Skip the locator and use this binary.
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,
}

fn default_schema_version() -> u32 {
    1
}

pub fn default_filename_template() -> String {
    "%(title).200s [%(id)s].%(ext)s".into()
}

fn default_subtitle_languages() -> Vec<String> {
    vec!["en".into()]
}

fn default_subtitle_format() -> String {
    "srt".into()
}

fn default_merge_output_format() -> Option<String> {
    Some("mp4".into())
}

fn default_info_timeout_secs() -> u64 {
    60
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            default_output_dir: dirs::download_dir(),
            video_quality: QualityTier::Auto,
            filename_template: default_filename_template(),
            download_subtitles: false,
            subtitle_languages: default_subtitle_languages(),
            subtitle_format: default_subtitle_format(),
            merge_output_format: default_merge_output_format(),
            extra_ytdlp_flags: Vec::new(),
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            info_timeout_secs: default_info_timeout_secs(),
            ytdlp_path: None,
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            download: DownloadSettings::default(),
            anti_detection: AntiDetectionSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}
