pub mod args;
pub mod dependencies;
pub mod download;
pub mod events;
pub mod hints;
pub mod info;
pub mod locator;
pub mod process;
pub mod progress;
pub mod session;
