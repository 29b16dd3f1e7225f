use serde::{Deserialize, Serialize};

/// Outcome of a completed recording session: requested duration versus
/// observed wall-clock duration, plus what actually landed on the medium.
///
/// Serializable for the JSON sidecar written next to the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,
    pub file_path: String,
    pub requested_minutes: u64,
    pub actual_ms: u64,
    pub payload_bytes: u64,
    pub epochs_drained: u64,
    pub checksum: Option<String>,
    pub created_at: String,
}

impl SessionStats {
    pub fn new(
        file_path: &str,
        requested_minutes: u64,
        actual_ms: u64,
        payload_bytes: u64,
        epochs_drained: u64,
        checksum: Option<String>,
    ) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.to_string(),
            requested_minutes,
            actual_ms,
            payload_bytes,
            epochs_drained,
            checksum,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn actual_minutes(&self) -> f64 {
        self.actual_ms as f64 / 60_000.0
    }
}
