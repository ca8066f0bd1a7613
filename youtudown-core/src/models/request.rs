use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{YtdlpError, YtdlpResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityTier {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "2160p")]
    P2160,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [Self::Auto, Self::P2160, Self::P1080, Self::P720];

    /// Height ceiling in pixels, `None` for auto.
    pub fn max_height(&self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::P2160 => Some(2160),
            Self::P1080 => Some(1080),
            Self::P720 => Some(720),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::P2160 => "2160p",
            Self::P1080 => "1080p",
            Self::P720 => "720p",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = YtdlpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "best" => Ok(Self::Auto),
            "2160p" | "2160" | "4k" => Ok(Self::P2160),
            "1080p" | "1080" => Ok(Self::P1080),
            "720p" | "720" => Ok(Self::P720),
            other => {
                let known: Vec<&str> = Self::ALL.iter().map(|q| q.as_str()).collect();
                Err(YtdlpError::validation(format!(
                    "unknown quality '{}', expected one of {}",
                    other,
                    known.join(", ")
                )))
            }
        }
    }
}

/// Everything one download needs. Built fresh per user action.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: QualityTier,
    /// Seconds from the start of the video.
    pub start: Option<u64>,
    /// Seconds from the start of the video, exclusive upper bound of the range.
    pub end: Option<u64>,
    pub subtitles: bool,
    pub subtitle_languages: Vec<String>,
    pub output_dir: Option<PathBuf>,
    /// Known source duration in whole seconds, from fetched metadata.
    pub source_duration: Option<u64>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Reject malformed input before anything is spawned.
    pub fn validate(&self) -> YtdlpResult<()> {
        validate_url(&self.url)?;

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end <= start {
                return Err(YtdlpError::validation(
                    "the end of the range must come after its start",
                ));
            }
        }

        if let Some(duration) = self.source_duration {
            if let Some(start) = self.start {
                if start >= duration {
                    return Err(YtdlpError::validation(
                        "the start of the range is past the end of the video",
                    ));
                }
            }
            if let Some(end) = self.end {
                if end > duration {
                    return Err(YtdlpError::validation(
                        "the end of the range exceeds the video duration",
                    ));
                }
            }
        }

        if self.end == Some(0) {
            return Err(YtdlpError::validation("the end of the range must be positive"));
        }

        if self.subtitles && self.subtitle_languages.iter().all(|l| l.trim().is_empty()) {
            return Err(YtdlpError::validation(
                "subtitles are enabled but no language was given",
            ));
        }

        Ok(())
    }
}

/// A URL must be non-empty and http(s) before it is handed to yt-dlp.
pub fn validate_url(url: &str) -> YtdlpResult<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(YtdlpError::validation("the URL is empty"));
    }
    let parsed = url::Url::parse(url)
        .map_err(|e| YtdlpError::validation(format!("'{}' is not a valid URL: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(YtdlpError::validation(format!(
            "unsupported URL scheme '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DownloadRequest {
        DownloadRequest::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
    }

    #[test]
    fn quality_parses_common_spellings() {
        assert_eq!("1080p".parse::<QualityTier>().unwrap(), QualityTier::P1080);
        assert_eq!("4K".parse::<QualityTier>().unwrap(), QualityTier::P2160);
        assert_eq!("best".parse::<QualityTier>().unwrap(), QualityTier::Auto);
        assert!("480p".parse::<QualityTier>().is_err());
    }

    #[test]
    fn unknown_quality_lists_every_tier() {
        let msg = "480p".parse::<QualityTier>().unwrap_err().to_string();
        for tier in QualityTier::ALL {
            assert!(msg.contains(tier.as_str()), "{} missing from {}", tier, msg);
        }
    }

    #[test]
    fn quality_serde_uses_labels() {
        let json = serde_json::to_string(&QualityTier::P720).unwrap();
        assert_eq!(json, "\"720p\"");
        let back: QualityTier = serde_json::from_str("\"2160p\"").unwrap();
        assert_eq!(back, QualityTier::P2160);
    }

    #[test]
    fn empty_url_is_rejected() {
        let req = DownloadRequest::new("   ");
        assert!(matches!(req.validate(), Err(YtdlpError::Validation(_))));
    }

    #[test]
    fn non_http_url_is_rejected() {
        assert!(validate_url("ftp://example.com/video").is_err());
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("https://vimeo.com/1").is_ok());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut req = request();
        req.start = Some(90);
        req.end = Some(90);
        assert!(req.validate().is_err());
        req.end = Some(225);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn range_must_fit_duration() {
        let mut req = request();
        req.source_duration = Some(300);
        req.start = Some(300);
        assert!(req.validate().is_err());

        req.start = Some(10);
        req.end = Some(301);
        assert!(req.validate().is_err());

        req.end = Some(300);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn subtitles_need_a_language() {
        let mut req = request();
        req.subtitles = true;
        assert!(req.validate().is_err());
        req.subtitle_languages = vec!["en".into()];
        assert!(req.validate().is_ok());
    }
}
