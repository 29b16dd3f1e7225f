pub mod arena;
pub mod wav_format;
