use serde::{Deserialize, Serialize};

/// What yt-dlp reported about a remote video. Replaced wholesale on every
/// fetch, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    /// Seconds, never negative. Live streams report 0.
    pub duration: f64,
    pub thumbnail: String,
    pub formats: Vec<Format>,
}

impl VideoMetadata {
    /// Duration rounded to whole seconds, the unit time ranges are picked in.
    pub fn duration_secs(&self) -> u64 {
        self.duration.max(0.0).round() as u64
    }

    /// Distinct video heights, highest first.
    pub fn available_heights(&self) -> Vec<u32> {
        let mut heights: Vec<u32> = self.formats.iter().filter_map(|f| f.height).collect();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();
        heights
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Format {
    pub format_id: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub ext: String,
    pub filesize: Option<u64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

impl Format {
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|v| v != "none")
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref().is_some_and(|a| a != "none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(id: &str, height: Option<u32>) -> Format {
        Format {
            format_id: id.into(),
            height,
            width: None,
            ext: "mp4".into(),
            filesize: None,
            vcodec: Some("avc1".into()),
            acodec: Some("none".into()),
        }
    }

    #[test]
    fn heights_are_sorted_and_unique() {
        let meta = VideoMetadata {
            id: "x".into(),
            title: "t".into(),
            duration: 10.0,
            thumbnail: String::new(),
            formats: vec![
                format("1", Some(720)),
                format("2", None),
                format("3", Some(1080)),
                format("4", Some(720)),
            ],
        };
        assert_eq!(meta.available_heights(), vec![1080, 720]);
    }

    #[test]
    fn duration_rounds_and_clamps() {
        let mut meta = VideoMetadata {
            id: "x".into(),
            title: "t".into(),
            duration: 225.4,
            thumbnail: String::new(),
            formats: vec![],
        };
        assert_eq!(meta.duration_secs(), 225);
        meta.duration = -3.0;
        assert_eq!(meta.duration_secs(), 0);
    }

    #[test]
    fn codec_none_means_missing_stream() {
        let f = format("1", Some(720));
        assert!(f.has_video());
        assert!(!f.has_audio());
    }
}
