pub mod events;
pub mod ytdlp;
