use std::io::Write;

use youtudown_core::core::events::{DownloadEvent, EventEmitter};
use youtudown_core::models::progress::{OutputStream, ProgressEvent};

/// Renders download events on the terminal. Progress redraws one stderr
/// line; stdout only gets the final result.
#[derive(Clone, Default)]
pub struct TerminalEmitter;

impl TerminalEmitter {
    pub fn new() -> Self {
        Self
    }
}

pub fn render_progress(event: &ProgressEvent) -> String {
    let mut line = format!("{:5.1}%", event.percent);
    if let Some(speed) = &event.speed {
        line.push_str(&format!(" at {}", speed));
    }
    if let Some(eta) = &event.eta {
        line.push_str(&format!(" ETA {}", eta));
    }
    line
}

impl EventEmitter for TerminalEmitter {
    fn emit(&self, event: DownloadEvent) {
        let mut err = std::io::stderr().lock();
        match event {
            DownloadEvent::MetadataReady(meta) => {
                let _ = writeln!(err, "{} [{}]", meta.title, meta.id);
            }
            DownloadEvent::Progress(progress) => {
                let _ = write!(err, "\r\x1b[2K{}", render_progress(&progress));
                let _ = err.flush();
            }
            DownloadEvent::Log { stream, line } => match stream {
                OutputStream::Stderr => tracing::warn!("{}", line),
                OutputStream::Stdout => tracing::debug!("{}", line),
            },
            DownloadEvent::Completed => {
                let _ = writeln!(err);
                println!("done");
            }
            DownloadEvent::Failed { .. } => {
                let _ = writeln!(err);
            }
            DownloadEvent::Cancelled => {
                let _ = writeln!(err, "\ncancelled");
            }
        }
    }
}
