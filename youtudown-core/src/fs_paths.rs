use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "youtudown";

/// Directories the application reads from and writes to.
pub trait AppPaths: Send + Sync {
    fn data_dir(&self) -> PathBuf;

    /// Where the application keeps its own copies of external tools.
    fn bin_dir(&self) -> Option<PathBuf>;
}

pub struct DesktopPaths;

impl AppPaths for DesktopPaths {
    fn data_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("YOUTUDOWN_DATA_DIR") {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn bin_dir(&self) -> Option<PathBuf> {
        Some(self.data_dir().join("bin"))
    }
}

/// Paths rooted at a fixed directory; handy for portable installs and tests.
pub struct FixedPaths(pub PathBuf);

impl AppPaths for FixedPaths {
    fn data_dir(&self) -> PathBuf {
        self.0.clone()
    }

    fn bin_dir(&self) -> Option<PathBuf> {
        Some(self.0.join("bin"))
    }
}
