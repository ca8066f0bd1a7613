//! Pure mapping from a [`DownloadRequest`] to yt-dlp command-line tokens.
//!
//! Token order is fixed: base flags, format selection, anti-detection
//! flags, section selection, subtitles, output template, extra flags, URL.

use std::path::Path;

use crate::models::request::{DownloadRequest, QualityTier};
use crate::models::settings::{AntiDetectionSettings, AppSettings};

/// Always passed: no interactive warnings, one progress update per line.
pub const BASE_FLAGS: [&str; 3] = ["--no-warnings", "--newline", "--no-playlist"];

pub fn format_selector(quality: QualityTier) -> String {
    match quality.max_height() {
        Some(h) => format!("bv*[height<={}]+ba/b[height<={}]", h, h),
        None => "bv*+ba/b".to_string(),
    }
}

/// `HH:MM:SS`, every field zero-padded to at least two digits.
pub fn format_timecode(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Accepts `HH:MM:SS`, `MM:SS` or plain seconds.
pub fn parse_timecode(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut fields = Vec::with_capacity(parts.len());
    for part in &parts {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        fields.push(part.parse::<u64>().ok()?);
    }

    match fields.as_slice() {
        [secs] => Some(*secs),
        [m, s] if *s < 60 => m.checked_mul(60)?.checked_add(*s),
        [h, m, s] if *m < 60 && *s < 60 => h.checked_mul(3600)?.checked_add(m * 60 + s),
        _ => None,
    }
}

/// The `--download-sections` value, or `None` when the whole video is wanted.
pub fn section_spec(request: &DownloadRequest) -> Option<String> {
    if request.start.is_none() && request.end.is_none() {
        return None;
    }

    let start = request.start.unwrap_or(0);
    let end = request.end.or(request.source_duration);

    let covers_everything = start == 0
        && match end {
            None => true,
            Some(e) => Some(e) == request.source_duration,
        };
    if covers_everything {
        return None;
    }

    let end_label = match end {
        Some(e) => format_timecode(e),
        None => "inf".to_string(),
    };
    Some(format!("*{}-{}", format_timecode(start), end_label))
}

pub fn anti_detection_args(anti: &AntiDetectionSettings) -> Vec<String> {
    let mut args = Vec::new();

    let pairs = [
        ("--impersonate", anti.impersonate.as_deref()),
        ("--user-agent", anti.user_agent.as_deref()),
        ("--cookies-from-browser", anti.cookies_from_browser.as_deref()),
    ];
    for (flag, value) in pairs {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            args.push(flag.to_string());
            args.push(v.to_string());
        }
    }

    if let Some(secs) = anti.sleep_requests.filter(|s| *s > 0.0) {
        args.push("--sleep-requests".to_string());
        args.push(secs.to_string());
    }

    if let Some(proxy) = anti.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        args.push("--proxy".to_string());
        args.push(proxy.to_string());
    }

    args
}

pub fn output_template(output_dir: Option<&Path>, template: &str) -> String {
    match output_dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(template).to_string_lossy().to_string(),
        _ => template.to_string(),
    }
}

/// Build the full download command line. The request must already be validated.
pub fn build_args(request: &DownloadRequest, settings: &AppSettings) -> Vec<String> {
    let download = &settings.download;

    let mut args: Vec<String> = BASE_FLAGS.iter().map(|f| f.to_string()).collect();

    args.push("-f".to_string());
    args.push(format_selector(request.quality));
    if let Some(container) = download.merge_output_format.as_deref().filter(|c| !c.is_empty()) {
        args.push("--merge-output-format".to_string());
        args.push(container.to_string());
    }

    args.extend(anti_detection_args(&settings.anti_detection));

    if let Some(section) = section_spec(request) {
        args.push("--download-sections".to_string());
        args.push(section);
    }

    if request.subtitles {
        let langs: Vec<&str> = request
            .subtitle_languages
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        args.extend([
            "--write-subs".to_string(),
            "--sub-langs".to_string(),
            langs.join(","),
            "--sub-format".to_string(),
            download.subtitle_format.clone(),
        ]);
    }

    args.push("-o".to_string());
    args.push(output_template(
        request.output_dir.as_deref(),
        &download.filename_template,
    ));

    args.extend(download.extra_ytdlp_flags.iter().cloned());

    args.push(request.url.trim().to_string());
    args
}

/// Command line for a metadata-only fetch.
pub fn info_args(url: &str, settings: &AppSettings) -> Vec<String> {
    let mut args = vec![
        "--dump-json".to_string(),
        "--no-warnings".to_string(),
        "--no-playlist".to_string(),
    ];
    args.extend(anti_detection_args(&settings.anti_detection));
    args.push(url.trim().to_string());
    args
}
