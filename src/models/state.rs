/// Recorder state machine.
///
/// State transitions:
/// ```text
/// idle --(cycles until arena full <= lead margin)--> medium opening
/// medium opening --(medium opened)--> recording
/// recording --(immediately)--> draining
/// draining --(drain complete)--> idle
/// ```
///
/// Idle is both the initial state and the terminal state of each
/// fill/drain cycle. A failed medium open drops back to idle and fails
/// the session; a failed block write aborts the drain without retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    MediumOpening,
    Recording,
    Draining,
}

impl RecorderState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_draining(&self) -> bool {
        matches!(self, Self::Draining)
    }

    /// Whether a drain has been requested but not yet completed.
    pub fn drain_outstanding(&self) -> bool {
        !self.is_idle()
    }
}
