pub mod media;
pub mod progress;
pub mod request;
pub mod settings;
