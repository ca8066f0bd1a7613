use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::media::VideoMetadata;
use crate::models::progress::{OutputStream, ProgressEvent};

/// Everything a front-end hears about one download. A run ends with exactly
/// one of `Completed`, `Failed` or `Cancelled`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum DownloadEvent {
    MetadataReady(VideoMetadata),
    Progress(ProgressEvent),
    Log { stream: OutputStream, line: String },
    Completed,
    Failed { message: String },
    Cancelled,
}

impl DownloadEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadEvent::Completed | DownloadEvent::Failed { .. } | DownloadEvent::Cancelled
        )
    }
}

pub trait EventEmitter: Send + Sync + Clone + 'static {
    fn emit(&self, event: DownloadEvent);
}

/// Forwards events into a tokio channel. Sends after the receiver is gone
/// are dropped.
#[derive(Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<DownloadEvent>,
}

impl ChannelEmitter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DownloadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventEmitter for ChannelEmitter {
    fn emit(&self, event: DownloadEvent) {
        let _ = self.tx.send(event);
    }
}
