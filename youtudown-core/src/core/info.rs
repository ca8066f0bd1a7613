use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::core::args;
use crate::core::process::ProcessLauncher;
use crate::models::media::{Format, VideoMetadata};
use crate::models::progress::OutputStream;
use crate::models::settings::AppSettings;
use crate::{YtdlpError, YtdlpResult};

// yt-dlp extractors are loose about types: heights come as `720.0`, sizes
// as floats or strings. A field of the wrong type degrades to `None`.

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite() && *v >= 0.0))
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(lenient_f64(d)?.map(|v| v.round() as u64))
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_u64(d)?.and_then(|v| u32::try_from(v).ok()))
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    format_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    ext: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    filesize_approx: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    #[serde(default, deserialize_with = "lenient_string")]
    format_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    height: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    width: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    ext: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    filesize_approx: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    vcodec: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    acodec: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawFormat {
    fn into_format(self) -> Option<Format> {
        Some(Format {
            format_id: non_empty(self.format_id)?,
            height: self.height,
            width: self.width,
            ext: self.ext.unwrap_or_else(|| "unknown".to_string()),
            filesize: self.filesize.or(self.filesize_approx),
            vcodec: self.vcodec,
            acodec: self.acodec,
        })
    }
}

impl RawInfo {
    fn into_metadata(self) -> YtdlpResult<VideoMetadata> {
        let id = non_empty(self.id)
            .ok_or_else(|| YtdlpError::Decode("info document has no id".to_string()))?;
        let title = non_empty(self.title)
            .ok_or_else(|| YtdlpError::Decode("info document has no title".to_string()))?;

        let formats = match self.formats {
            Some(Value::Array(list)) => list
                .into_iter()
                .filter_map(|raw| serde_json::from_value::<RawFormat>(raw).ok())
                .filter_map(RawFormat::into_format)
                .collect(),
            _ => match non_empty(self.format_id) {
                Some(format_id) => vec![Format {
                    format_id,
                    height: None,
                    width: None,
                    ext: self.ext.unwrap_or_else(|| "unknown".to_string()),
                    filesize: self.filesize.or(self.filesize_approx),
                    vcodec: None,
                    acodec: None,
                }],
                None => Vec::new(),
            },
        };

        Ok(VideoMetadata {
            id,
            title,
            duration: self.duration.unwrap_or(0.0),
            thumbnail: self.thumbnail.unwrap_or_default(),
            formats,
        })
    }
}

/// Decode `--dump-json` output. The first line that parses as a JSON object
/// is the document; playlists print one per entry.
pub fn decode_info<'a, I>(lines: I) -> YtdlpResult<VideoMetadata>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut last_error = None;
    for line in lines {
        let line = line.trim();
        if !line.starts_with('{') {
            continue;
        }
        match serde_json::from_str::<RawInfo>(line) {
            Ok(raw) => return raw.into_metadata(),
            Err(e) => last_error = Some(e.to_string()),
        }
    }
    Err(YtdlpError::Decode(
        last_error.unwrap_or_else(|| "yt-dlp printed no info document".to_string()),
    ))
}

/// Run yt-dlp in metadata-only mode and decode its answer.
///
/// Expiry of `timeout` kills the child and returns the retryable
/// [`YtdlpError::Timeout`]. Nothing is retried here.
pub async fn fetch_video_info(
    launcher: &dyn ProcessLauncher,
    ytdlp: &Path,
    url: &str,
    settings: &AppSettings,
    timeout: Duration,
) -> YtdlpResult<VideoMetadata> {
    let started = std::time::Instant::now();
    let cancel = CancellationToken::new();
    let handle = launcher
        .launch(ytdlp, &args::info_args(url, settings), cancel.clone())
        .await;

    let (lines, outcome) = match tokio::time::timeout(timeout, handle.collect()).await {
        Ok(done) => done,
        Err(_) => {
            cancel.cancel();
            tracing::warn!("info fetch for {} timed out after {:?}", url, timeout);
            return Err(YtdlpError::Timeout(timeout));
        }
    };

    outcome.into_result(&ytdlp.display().to_string())?;

    let stdout = lines
        .iter()
        .filter(|l| l.stream == OutputStream::Stdout)
        .map(|l| l.text.as_str());
    let info = decode_info(stdout)?;

    tracing::debug!(
        "[perf] fetch_video_info({}) took {:?}, {} formats",
        url,
        started.elapsed(),
        info.formats.len()
    );
    Ok(info)
}
