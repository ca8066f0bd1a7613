use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use youtudown_core::core::args::parse_timecode;
use youtudown_core::core::session::MediaSession;
use youtudown_core::models::request::{DownloadRequest, QualityTier};
use youtudown_core::models::settings::AppSettings;
use youtudown_core::YtdlpError;

use crate::core::events::TerminalEmitter;
use crate::core::ytdlp;
use crate::AppContext;

pub struct DownloadOptions {
    pub url: String,
    pub quality: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub subtitles: bool,
    pub subtitle_languages: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
}

fn parse_offset(label: &str, value: Option<&str>) -> anyhow::Result<Option<u64>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_timecode(v)
            .map(Some)
            .ok_or_else(|| anyhow!("invalid {} time '{}', expected HH:MM:SS", label, v)),
    }
}

/// Turn command-line options into a request, filling gaps from the settings.
pub fn build_request(options: &DownloadOptions, settings: &AppSettings) -> anyhow::Result<DownloadRequest> {
    let quality = match options.quality.as_deref() {
        Some(q) => q.parse::<QualityTier>()?,
        None => settings.download.video_quality,
    };

    let subtitle_languages = if options.subtitle_languages.is_empty() {
        settings.download.subtitle_languages.clone()
    } else {
        options.subtitle_languages.clone()
    };

    Ok(DownloadRequest {
        url: options.url.trim().to_string(),
        quality,
        start: parse_offset("start", options.start.as_deref())?,
        end: parse_offset("end", options.end.as_deref())?,
        subtitles: options.subtitles || settings.download.download_subtitles,
        subtitle_languages,
        output_dir: options.output_dir.clone(),
        source_duration: None,
    })
}

fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

pub async fn download(ctx: &AppContext, options: DownloadOptions) -> anyhow::Result<()> {
    let request = build_request(&options, &ctx.settings)?;
    let has_range = request.start.is_some() || request.end.is_some();

    let ytdlp_path = match ytdlp::find_ytdlp(&ctx.settings, ctx.paths.as_ref()) {
        Ok(path) => path,
        Err(e) if options.dry_run => {
            tracing::warn!("{}", e);
            PathBuf::from("yt-dlp")
        }
        Err(e) => return Err(e.into()),
    };

    let mut session = MediaSession::new(
        ytdlp::launcher(ctx.paths.as_ref()),
        ytdlp_path,
        Arc::new(ctx.settings.clone()),
    );
    session.set_url(&request.url);

    if options.dry_run {
        let args = session.prepare_download(request)?;
        let mut line = shell_quote(&session.ytdlp().to_string_lossy());
        for arg in &args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        println!("{}", line);
        return Ok(());
    }

    // The range has to be checked against the real duration.
    if has_range {
        session.fetch_info().await?;
    }

    let task = session.start_download(request, TerminalEmitter::new())?;
    let cancel = task.cancel_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, stopping yt-dlp");
            cancel.cancel();
        }
    });

    let result = task.join().await;
    ctrl_c.abort();

    match result {
        Ok(()) => Ok(()),
        Err(YtdlpError::Cancelled) => Err(anyhow!("download cancelled")),
        Err(e) => Err(e.into()),
    }
}
