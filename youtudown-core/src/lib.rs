//! UI-free core of youtudown: locating yt-dlp, building its command line,
//! running it, and turning its output into structured events.

pub mod core;
pub mod error;
pub mod fs_paths;
pub mod models;

pub use error::{YtdlpError, YtdlpResult};
