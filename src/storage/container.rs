use std::io::{Seek, SeekFrom, Write};

use crate::models::error::RecorderError;
use crate::processing::wav_format;
use crate::traits::medium::{MediumFile, OpenMode, StorageMedium};

/// Create the container at `path`: a 44-byte header with zeroed payload
/// size fields, to be patched by [`finalize`] once the session completes.
pub fn create(
    medium: &mut dyn StorageMedium,
    path: &str,
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
) -> Result<(), RecorderError> {
    let header = wav_format::pcm_header(sample_rate, bit_depth, channels, 0);
    let mut file = medium.open(path, OpenMode::Create)?;
    file.write_all(&header)
        .map_err(|e| RecorderError::medium(&format!("failed to write header to {path}"), e))?;
    log::info!("container created: {path}");
    Ok(())
}

/// Append-only handle onto the container payload.
///
/// A short or failed write is fatal for the current session; the drain
/// aborts immediately and never retries mid-drain.
pub struct PayloadSink {
    file: Box<dyn MediumFile>,
    path: String,
    bytes_appended: u64,
}

impl PayloadSink {
    pub fn open(medium: &mut dyn StorageMedium, path: &str) -> Result<Self, RecorderError> {
        let file = medium.open(path, OpenMode::Append)?;
        Ok(Self {
            file,
            path: path.to_string(),
            bytes_appended: 0,
        })
    }

    pub fn append(&mut self, pcm: &[u8]) -> Result<(), RecorderError> {
        self.file.write_all(pcm).map_err(|e| {
            RecorderError::medium(&format!("payload write to {} failed", self.path), e)
        })?;
        self.bytes_appended += pcm.len() as u64;
        Ok(())
    }

    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended
    }

    /// Flush and release the handle.
    pub fn finish(mut self) -> Result<(), RecorderError> {
        self.file
            .flush()
            .map_err(|e| RecorderError::medium(&format!("flush of {} failed", self.path), e))
    }
}

/// Patch the container's two size fields from the file's actual length.
///
/// Returns the payload length. Fails without touching the header when the
/// file is shorter than the header itself, leaving the placeholders in
/// place; the container stays syntactically invalid until a nonempty
/// session completes. Idempotent on completed containers.
pub fn finalize(medium: &mut dyn StorageMedium, path: &str) -> Result<u32, RecorderError> {
    let mut file = medium.open(path, OpenMode::ReadUpdate)?;

    let total = file
        .seek(SeekFrom::End(0))
        .map_err(|e| RecorderError::medium(&format!("failed to size {path}"), e))?;
    if total < wav_format::WAV_HEADER_SIZE as u64 {
        return Err(RecorderError::Medium(format!(
            "{path} is shorter than the container header ({total} bytes)"
        )));
    }

    let payload = (total - wav_format::WAV_HEADER_SIZE as u64) as u32;
    patch_le_u32(&mut *file, path, wav_format::RIFF_SIZE_OFFSET, payload + 36)?;
    patch_le_u32(&mut *file, path, wav_format::DATA_SIZE_OFFSET, payload)?;
    file.flush()
        .map_err(|e| RecorderError::medium(&format!("flush of {path} failed"), e))?;

    log::info!("container finalized: {path} ({payload} payload bytes)");
    Ok(payload)
}

fn patch_le_u32(
    file: &mut dyn MediumFile,
    path: &str,
    offset: u64,
    value: u32,
) -> Result<(), RecorderError> {
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| RecorderError::medium(&format!("seek in {path} failed"), e))?;
    file.write_all(&value.to_le_bytes())
        .map_err(|e| RecorderError::medium(&format!("header patch of {path} failed"), e))
}
