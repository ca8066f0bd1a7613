//! State for one media source at a time: the URL the user typed and the
//! metadata last fetched for it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::core::args;
use crate::core::download::{spawn_download, DownloadTask};
use crate::core::events::{DownloadEvent, EventEmitter};
use crate::core::info;
use crate::core::process::ProcessLauncher;
use crate::models::media::VideoMetadata;
use crate::models::request::{validate_url, DownloadRequest};
use crate::models::settings::AppSettings;
use crate::YtdlpResult;

pub struct MediaSession {
    launcher: Arc<dyn ProcessLauncher>,
    ytdlp: PathBuf,
    settings: Arc<AppSettings>,
    url: String,
    metadata: Option<VideoMetadata>,
}

impl MediaSession {
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        ytdlp: PathBuf,
        settings: Arc<AppSettings>,
    ) -> Self {
        Self {
            launcher,
            ytdlp,
            settings,
            url: String::new(),
            metadata: None,
        }
    }

    pub fn ytdlp(&self) -> &Path {
        &self.ytdlp
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    /// Metadata belongs to one URL; changing it drops what was fetched.
    pub fn set_url(&mut self, url: &str) {
        let url = url.trim();
        if url != self.url {
            self.url = url.to_string();
            self.metadata = None;
        }
    }

    /// Fetch metadata for the current URL. On failure the previous
    /// metadata is left alone.
    pub async fn fetch_info(&mut self) -> YtdlpResult<&VideoMetadata> {
        validate_url(&self.url)?;
        let timeout = Duration::from_secs(self.settings.advanced.info_timeout_secs.max(1));
        let fetched = info::fetch_video_info(
            self.launcher.as_ref(),
            &self.ytdlp,
            &self.url,
            &self.settings,
            timeout,
        )
        .await?;
        tracing::info!("fetched \"{}\" ({}s)", fetched.title, fetched.duration_secs());
        Ok(self.metadata.insert(fetched))
    }

    /// Fill what the session knows into `request`, validate it and build
    /// the command line.
    pub fn prepare_download(&self, mut request: DownloadRequest) -> YtdlpResult<Vec<String>> {
        if request.source_duration.is_none() && request.url.trim() == self.url {
            request.source_duration = self
                .metadata
                .as_ref()
                .map(VideoMetadata::duration_secs)
                .filter(|d| *d > 0);
        }
        if request.output_dir.is_none() {
            request.output_dir = self.settings.download.default_output_dir.clone();
        }
        request.validate()?;
        Ok(args::build_args(&request, &self.settings))
    }

    /// Validate and start a download in the background. Metadata already
    /// fetched for the same URL is announced first.
    pub fn start_download<E: EventEmitter>(
        &self,
        request: DownloadRequest,
        emitter: E,
    ) -> YtdlpResult<DownloadTask> {
        let url = request.url.trim().to_string();
        let same_source = url == self.url;
        let args = self.prepare_download(request)?;

        if same_source {
            if let Some(meta) = &self.metadata {
                emitter.emit(DownloadEvent::MetadataReady(meta.clone()));
            }
        }

        tracing::info!("starting download of {}", url);
        Ok(spawn_download(
            Arc::clone(&self.launcher),
            self.ytdlp.clone(),
            args,
            emitter,
        ))
    }
}
