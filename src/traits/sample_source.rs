use crate::models::error::RecorderError;

/// Interface to the real-time sample source (e.g. an I2S codec).
///
/// The capture loop is paced by `read`: a conforming implementation
/// blocks until samples arrive or the timeout elapses, so a call never
/// returns without wall-clock time having passed.
pub trait SampleSource: Send {
    /// Blocking read of interleaved 16-bit stereo samples.
    ///
    /// Returns the number of samples written into `buf`.
    fn read(&mut self, buf: &mut [i16], timeout_ms: u32) -> Result<usize, RecorderError>;

    /// Full-duplex monitor passthrough of the samples just read.
    ///
    /// Returns the number of samples accepted.
    fn write(&mut self, buf: &[i16], timeout_ms: u32) -> Result<usize, RecorderError>;
}
