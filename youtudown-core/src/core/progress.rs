//! Parser for yt-dlp's default progress lines.
//!
//! With `--newline`, yt-dlp prints one line per update:
//!
//! ```text
//! [download]  42.0% of 125.89MiB at  5.82MiB/s ETA 00:12
//! [download]  42.0% of ~125.89MiB at 5.82MiB/s ETA 00:12 (frag 3/40)
//! [download] 100% of 125.89MiB in 00:00:22 at 5.6MiB/s
//! ```
//!
//! The format belongs to yt-dlp and may drift between releases, so a line
//! that does not fit is passed through as log text instead of failing.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::progress::ProgressEvent;

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[download\]\s+(\d+(?:\.\d+)?)%").unwrap());
static SPEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\sat\s+(Unknown B/s|\S+)").unwrap());
static ETA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\sETA\s+(\S+)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Progress(ProgressEvent),
    Log(String),
}

pub fn classify(line: &str) -> ParsedLine {
    match parse_progress(line) {
        Some(event) => ParsedLine::Progress(event),
        None => ParsedLine::Log(line.to_string()),
    }
}

pub fn parse_progress(line: &str) -> Option<ProgressEvent> {
    let caps = PERCENT_RE.captures(line)?;
    let percent = caps.get(1)?.as_str().parse::<f64>().ok()?;
    if !(0.0..=100.0).contains(&percent) {
        return None;
    }

    let speed = SPEED_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.starts_with("Unknown"))
        .map(str::to_string);

    let eta = ETA_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| *s != "Unknown")
        .map(str::to_string);

    Some(ProgressEvent {
        percent,
        speed,
        eta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_line() {
        let event = parse_progress("[download]  42.0% of 125.89MiB at  5.82MiB/s ETA 00:12").unwrap();
        assert_eq!(event.percent, 42.0);
        assert_eq!(event.speed.as_deref(), Some("5.82MiB/s"));
        assert_eq!(event.eta.as_deref(), Some("00:12"));
    }

    #[test]
    fn parses_fragmented_estimate() {
        let event =
            parse_progress("[download]  12.5% of ~ 80.00MiB at 1.20MiB/s ETA 01:05 (frag 3/40)")
                .unwrap();
        assert_eq!(event.percent, 12.5);
        assert_eq!(event.speed.as_deref(), Some("1.20MiB/s"));
        assert_eq!(event.eta.as_deref(), Some("01:05"));
    }

    #[test]
    fn parses_finished_line_without_eta() {
        let event = parse_progress("[download] 100% of 125.89MiB in 00:00:22 at 5.6MiB/s").unwrap();
        assert_eq!(event.percent, 100.0);
        assert_eq!(event.speed.as_deref(), Some("5.6MiB/s"));
        assert!(event.eta.is_none());
    }

    #[test]
    fn unknown_fields_become_none() {
        let event = parse_progress("[download]   0.0% of 10.00MiB at Unknown B/s ETA Unknown").unwrap();
        assert_eq!(event.percent, 0.0);
        assert!(event.speed.is_none());
        assert!(event.eta.is_none());
    }

    #[test]
    fn non_progress_lines_pass_through() {
        let line = "[download] Destination: /tmp/out/video.mp4";
        assert_eq!(classify(line), ParsedLine::Log(line.to_string()));
        assert_eq!(
            classify("[youtube] dQw4w9WgXcQ: Downloading webpage"),
            ParsedLine::Log("[youtube] dQw4w9WgXcQ: Downloading webpage".into())
        );
    }

    #[test]
    fn malformed_progress_is_a_no_op() {
        assert!(parse_progress("[download] NaN% of 10MiB").is_none());
        assert!(parse_progress("[download] 142.0% of 10MiB").is_none());
        assert!(parse_progress("[download]%").is_none());
        assert!(parse_progress("").is_none());
    }

    #[test]
    fn classify_wraps_progress() {
        match classify("[download]  50.0% of 2.00GiB at 10.00MiB/s ETA 01:42") {
            ParsedLine::Progress(event) => assert_eq!(event.percent, 50.0),
            other => panic!("expected progress, got {:?}", other),
        }
    }
}
