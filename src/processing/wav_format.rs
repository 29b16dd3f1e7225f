//! WAV container framing.
//!
//! The container is a standard 44-byte RIFF header followed by raw
//! interleaved little-endian PCM. The two size fields are written as
//! placeholders at creation and patched once the payload length is known.

/// Size of the RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Byte offset of the RIFF chunk-size field (payload + 36).
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Byte offset of the data chunk-size field (payload length).
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Build a 44-byte linear-PCM header (format code 1).
///
/// ```text
/// [0-3]   "RIFF"      [4-7]   payload + 36
/// [8-11]  "WAVE"      [12-15] "fmt "
/// [16-19] 16          [20-21] 1 (PCM)
/// [22-23] channels    [24-27] sample_rate
/// [28-31] byte_rate   [32-33] block_align
/// [34-35] bit_depth   [36-39] "data"
/// [40-43] payload
/// ```
pub fn pcm_header(
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
    payload_len: u32,
) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate * channels as u32 * bit_depth as u32 / 8;
    let block_align = channels * bit_depth / 8;

    let mut header = [0u8; WAV_HEADER_SIZE];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(payload_len + 36).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&payload_len.to_le_bytes());

    header
}
