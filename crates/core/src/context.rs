use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CleanResult;
use crate::settings::{load_settings, Settings};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeFlags {
    pub do_not_clean: bool,
}

#[derive(Debug, Clone)]
pub struct CleanContext {
    pub settings: Settings,
    pub settings_path: Option<PathBuf>,
    pub flags: RuntimeFlags,
    pub install_root: PathBuf,
}

impl CleanContext {
    pub fn new(settings: Settings, install_root: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            settings_path: None,
            flags: RuntimeFlags::default(),
            install_root: install_root.into(),
        }
    }

    pub fn from_settings_file(
        path: impl AsRef<Path>,
        install_root: impl Into<PathBuf>,
    ) -> CleanResult<Self> {
        let path = path.as_ref();
        let settings = load_settings(path)?;
        Ok(Self {
            settings,
            settings_path: Some(path.to_path_buf()),
            flags: RuntimeFlags::default(),
            install_root: install_root.into(),
        })
    }

    pub fn with_flags(mut self, flags: RuntimeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_local_checkout(&self) -> bool {
        if let Some(forced) = self.settings.local_checkout {
            return forced;
        }
        detect_local_checkout(&self.install_root)
    }

    /// Re-reads the settings source, or falls back to built-in defaults when
    /// the context was not built from a file. Runtime flags are kept.
    pub fn reload_settings(&mut self) -> CleanResult<()> {
        self.settings = match &self.settings_path {
            Some(path) => {
                debug!("reloading settings from {}", path.display());
                load_settings(path)?
            }
            None => Settings::default(),
        };
        Ok(())
    }
}

pub fn detect_local_checkout(root: &Path) -> bool {
    root.join(".git").is_dir() && root.join("Cargo.toml").is_file()
}
