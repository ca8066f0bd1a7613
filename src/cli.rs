use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "youtudown")]
#[command(author, version, about = "Download videos through yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show title, duration and available formats of a video
    Info {
        url: String,

        /// Print the metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a video
    Download {
        url: String,

        /// auto, 2160p, 1080p or 720p
        #[arg(short, long)]
        quality: Option<String>,

        /// Start of the range (HH:MM:SS, MM:SS or seconds)
        #[arg(long)]
        start: Option<String>,

        /// End of the range (HH:MM:SS, MM:SS or seconds)
        #[arg(long)]
        end: Option<String>,

        /// Also download subtitles
        #[arg(long)]
        subs: bool,

        /// Comma-separated subtitle languages, e.g. en,zh-CN
        #[arg(long, value_delimiter = ',')]
        sub_langs: Vec<String>,

        /// Destination directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the yt-dlp command line instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that yt-dlp and ffmpeg are installed
    Doctor,

    /// Show or change the stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings as JSON
    Show,

    /// Merge a JSON patch into the settings
    Set { patch: String },

    /// Restore the defaults
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_download_flags() {
        let cli = Cli::try_parse_from([
            "youtudown",
            "download",
            "https://youtu.be/x",
            "-q",
            "720p",
            "--start",
            "00:01:00",
            "--subs",
            "--sub-langs",
            "en,zh-CN",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Download {
                quality,
                start,
                end,
                subs,
                sub_langs,
                dry_run,
                ..
            } => {
                assert_eq!(quality.as_deref(), Some("720p"));
                assert_eq!(start.as_deref(), Some("00:01:00"));
                assert!(end.is_none());
                assert!(subs);
                assert_eq!(sub_langs, ["en", "zh-CN"]);
                assert!(dry_run);
            }
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn settings_requires_action() {
        assert!(Cli::try_parse_from(["youtudown", "settings"]).is_err());
        assert!(Cli::try_parse_from(["youtudown", "settings", "set", "{}"]).is_ok());
    }
}
