use std::fs::OpenOptions;
use std::path::PathBuf;

use crate::models::error::RecorderError;
use crate::traits::medium::{MediumFile, OpenMode, StorageMedium};

/// Storage medium backed by a host filesystem directory.
///
/// Medium paths (e.g. `/20260827_09-00-00.wav`) resolve relative to the
/// root directory, mirroring how a mounted card exposes its filesystem.
pub struct FsMedium {
    root: PathBuf,
    mounted: bool,
}

impl FsMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl StorageMedium for FsMedium {
    fn mount(&mut self) -> Result<(), RecorderError> {
        if self.mounted {
            return Ok(());
        }
        std::fs::create_dir_all(&self.root)
            .map_err(|e| RecorderError::medium("failed to mount medium root", e))?;
        self.mounted = true;
        log::info!("medium mounted at {}", self.root.display());
        Ok(())
    }

    fn unmount(&mut self) {
        if self.mounted {
            self.mounted = false;
            log::info!("medium unmounted");
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn MediumFile>, RecorderError> {
        if !self.mounted {
            return Err(RecorderError::Medium("medium not mounted".into()));
        }

        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Create => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true),
            OpenMode::ReadUpdate => options.read(true).write(true),
        };

        let file = options
            .open(self.resolve(path))
            .map_err(|e| RecorderError::medium(&format!("failed to open {path}"), e))?;
        Ok(Box::new(file))
    }
}
