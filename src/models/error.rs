use thiserror::Error;

/// Errors surfaced by the recorder core.
///
/// Medium and overrun failures are fatal to the current session; schedule
/// failures are recovered once by regenerating the default table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("medium error: {0}")]
    Medium(String),

    #[error("schedule error: {0}")]
    Schedule(String),

    #[error("capture overrun: capture cursor {capture} reached drain cursor {drain}")]
    CaptureOverrun { capture: usize, drain: usize },

    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("recorder halted: {0}")]
    Halted(String),
}

impl RecorderError {
    /// Wrap an I/O error from the persistent medium.
    pub fn medium(context: &str, err: std::io::Error) -> Self {
        Self::Medium(format!("{context}: {err}"))
    }
}
