use std::io::{Read, Seek, Write};

use crate::models::error::RecorderError;

/// File open modes the core needs from the medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only.
    Read,
    /// Create or truncate, then write.
    Create,
    /// Append binary.
    Append,
    /// Read/update binary (for header patching).
    ReadUpdate,
}

/// A file handle on the persistent medium.
pub trait MediumFile: Read + Write + Seek + Send {}

impl<T: Read + Write + Seek + Send> MediumFile for T {}

/// Interface to the persistent storage collaborator.
///
/// Implemented by [`FsMedium`](crate::storage::fs::FsMedium) for host
/// filesystems; embedded targets back it with their card driver. Writes
/// may block for unbounded time — only the drain context calls them.
pub trait StorageMedium: Send {
    /// Mount the medium. Idempotent.
    fn mount(&mut self) -> Result<(), RecorderError>;

    /// Unmount the medium and release resources.
    fn unmount(&mut self);

    /// Whether a file exists at `path` (paths are rooted at the medium).
    fn exists(&self, path: &str) -> bool;

    /// Open a file on the mounted medium.
    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn MediumFile>, RecorderError>;
}
