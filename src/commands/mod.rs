pub mod dependencies;
pub mod download;
pub mod info;
pub mod settings;
