use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use youtudown_core::fs_paths::{AppPaths, DesktopPaths};
use youtudown_core::models::settings::AppSettings;
use youtudown_core::YtdlpError;

pub mod cli;
pub mod commands;
pub mod core;
pub mod storage;

use cli::{Cli, Commands};

const DEFAULT_LOG_FILTER: &str = "youtudown=info,youtudown_core=info";

/// What every command starts from.
pub struct AppContext {
    pub paths: Box<dyn AppPaths>,
    pub settings: AppSettings,
}

impl AppContext {
    pub fn load(paths: Box<dyn AppPaths>) -> Self {
        let settings = storage::config::load_settings(paths.as_ref());
        Self { paths, settings }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ctx = AppContext::load(Box::new(DesktopPaths));
    match runtime.block_on(dispatch(ctx, cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(ctx: AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Info { url, json } => commands::info::show_info(&ctx, &url, json).await,
        Commands::Download {
            url,
            quality,
            start,
            end,
            subs,
            sub_langs,
            output,
            dry_run,
        } => {
            let options = commands::download::DownloadOptions {
                url,
                quality,
                start,
                end,
                subtitles: subs,
                subtitle_languages: sub_langs,
                output_dir: output,
                dry_run,
            };
            commands::download::download(&ctx, options).await
        }
        Commands::Doctor => commands::dependencies::doctor(&ctx).await,
        Commands::Settings { action } => commands::settings::handle(&ctx, action),
    }
}

/// Core failures carry remediation steps; everything else prints its chain.
fn describe(e: &anyhow::Error) -> String {
    match e.downcast_ref::<YtdlpError>() {
        Some(core_err) => core_err.user_message(),
        None => format!("{:#}", e),
    }
}
