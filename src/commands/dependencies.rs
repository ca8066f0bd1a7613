use anyhow::bail;
use youtudown_core::core::dependencies::{check_dependency, DependencyStatus};
use youtudown_core::core::locator::Locator;

use crate::core::ytdlp;
use crate::AppContext;

fn render_status(status: &DependencyStatus) -> String {
    match (&status.version, &status.path) {
        (Some(version), Some(path)) => {
            format!("{:<8} {:<20} {}", status.name, version, path.display())
        }
        (None, Some(path)) => format!("{:<8} {:<20} {}", status.name, "broken", path.display()),
        _ => format!("{:<8} missing", status.name),
    }
}

pub async fn doctor(ctx: &AppContext) -> anyhow::Result<()> {
    let launcher = ytdlp::launcher(ctx.paths.as_ref());
    let bin_dir = ctx.paths.bin_dir();
    let ytdlp_locator = Locator::ytdlp(bin_dir.clone());
    let ffmpeg_locator = Locator::ffmpeg(bin_dir);

    let (ytdlp_status, ffmpeg_status) = tokio::join!(
        check_dependency(launcher.as_ref(), &ytdlp_locator),
        check_dependency(launcher.as_ref(), &ffmpeg_locator),
    );

    println!("{}", render_status(&ytdlp_status));
    println!("{}", render_status(&ffmpeg_status));

    if !ffmpeg_status.installed {
        tracing::warn!("ffmpeg is missing; merging formats and cutting ranges will fail");
    }
    if !ytdlp_status.installed {
        // A configured binary bypasses the locator.
        if let Ok(path) = ytdlp::find_ytdlp(&ctx.settings, ctx.paths.as_ref()) {
            println!("configured yt-dlp: {}", path.display());
            return Ok(());
        }
        bail!("yt-dlp is not installed");
    }
    Ok(())
}
