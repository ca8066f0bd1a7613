use std::fmt::Write;

use youtudown_core::core::args::format_timecode;
use youtudown_core::core::session::MediaSession;
use youtudown_core::models::media::VideoMetadata;

use crate::core::ytdlp;
use crate::AppContext;

pub async fn show_info(ctx: &AppContext, url: &str, json: bool) -> anyhow::Result<()> {
    let ytdlp_path = ytdlp::find_ytdlp(&ctx.settings, ctx.paths.as_ref())?;
    let mut session = MediaSession::new(
        ytdlp::launcher(ctx.paths.as_ref()),
        ytdlp_path,
        std::sync::Arc::new(ctx.settings.clone()),
    );
    session.set_url(url);
    let meta = session.fetch_info().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(meta)?);
    } else {
        print!("{}", render_summary(meta));
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

pub fn render_summary(meta: &VideoMetadata) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", meta.title);
    let _ = writeln!(out, "id:       {}", meta.id);
    let _ = writeln!(out, "duration: {}", format_timecode(meta.duration_secs()));

    let heights = meta.available_heights();
    if !heights.is_empty() {
        let list: Vec<String> = heights.iter().map(|h| format!("{}p", h)).collect();
        let _ = writeln!(out, "heights:  {}", list.join(", "));
    }

    if !meta.formats.is_empty() {
        let _ = writeln!(out, "formats:");
        for f in &meta.formats {
            let res = match (f.width, f.height) {
                (Some(w), Some(h)) => format!("{}x{}", w, h),
                (None, Some(h)) => format!("{}p", h),
                _ if f.has_video() => "video".to_string(),
                _ => "audio".to_string(),
            };
            let size = f.filesize.map(format_size).unwrap_or_default();
            let _ = writeln!(out, "  {:<12} {:<5} {:<10} {}", f.format_id, f.ext, res, size);
        }
    }
    out
}
