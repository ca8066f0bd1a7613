//! Runs one yt-dlp download and translates its output into events.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::events::{DownloadEvent, EventEmitter};
use crate::core::process::ProcessLauncher;
use crate::core::progress::{self, ParsedLine};
use crate::{YtdlpError, YtdlpResult};

/// Stream a download to completion.
///
/// Progress lines become [`DownloadEvent::Progress`], everything else
/// becomes [`DownloadEvent::Log`]. Exactly one terminal event is emitted,
/// and it matches the returned result.
pub async fn run_download<E: EventEmitter>(
    launcher: &dyn ProcessLauncher,
    ytdlp: &Path,
    args: &[String],
    emitter: &E,
    cancel: CancellationToken,
) -> YtdlpResult<()> {
    let started = std::time::Instant::now();
    let mut handle = launcher.launch(ytdlp, args, cancel).await;

    let mut last_percent = None;
    while let Some(line) = handle.next_line().await {
        match progress::classify(&line.text) {
            ParsedLine::Progress(event) => {
                last_percent = Some(event.percent);
                emitter.emit(DownloadEvent::Progress(event));
            }
            ParsedLine::Log(text) => emitter.emit(DownloadEvent::Log {
                stream: line.stream,
                line: text,
            }),
        }
    }

    let result = handle.wait().await.into_result(&ytdlp.display().to_string());
    match &result {
        Ok(()) => {
            tracing::info!(
                "download finished in {:?} (last progress {:?})",
                started.elapsed(),
                last_percent
            );
            emitter.emit(DownloadEvent::Completed);
        }
        Err(YtdlpError::Cancelled) => {
            tracing::info!("download cancelled after {:?}", started.elapsed());
            emitter.emit(DownloadEvent::Cancelled);
        }
        Err(e) => {
            tracing::warn!(kind = e.kind(), "download failed: {}", e);
            emitter.emit(DownloadEvent::Failed {
                message: e.user_message(),
            });
        }
    }
    result
}

/// A download running on its own task.
pub struct DownloadTask {
    cancel: CancellationToken,
    join: JoinHandle<YtdlpResult<()>>,
}

impl DownloadTask {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn join(self) -> YtdlpResult<()> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(YtdlpError::Process {
                exit_code: None,
                stderr: format!("download task stopped: {}", e),
            }),
        }
    }
}

/// Start [`run_download`] in the background. The caller never waits on the
/// child; it follows the run through `emitter`.
pub fn spawn_download<E: EventEmitter>(
    launcher: Arc<dyn ProcessLauncher>,
    ytdlp: PathBuf,
    args: Vec<String>,
    emitter: E,
) -> DownloadTask {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let join = tokio::spawn(async move {
        run_download(launcher.as_ref(), &ytdlp, &args, &emitter, token).await
    });
    DownloadTask { cancel, join }
}
