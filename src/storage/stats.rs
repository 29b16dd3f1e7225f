use std::io::Read;

use sha2::{Digest, Sha256};

use crate::models::error::RecorderError;
use crate::models::session_stats::SessionStats;
use crate::traits::medium::{OpenMode, StorageMedium};

/// Write session stats as a JSON sidecar next to the recording:
/// `/20260827_09-00-00.wav` → `/20260827_09-00-00.stats.json`.
pub fn write_sidecar(
    medium: &mut dyn StorageMedium,
    recording_path: &str,
    stats: &SessionStats,
) -> Result<(), RecorderError> {
    let json = serde_json::to_string_pretty(stats)
        .map_err(|e| RecorderError::Medium(format!("failed to serialize stats: {e}")))?;
    let mut file = medium.open(&sidecar_path(recording_path), OpenMode::Create)?;
    use std::io::Write;
    file.write_all(json.as_bytes())
        .map_err(|e| RecorderError::medium("failed to write stats sidecar", e))
}

/// Read session stats back from the sidecar.
pub fn read_sidecar(
    medium: &mut dyn StorageMedium,
    recording_path: &str,
) -> Result<SessionStats, RecorderError> {
    let mut file = medium.open(&sidecar_path(recording_path), OpenMode::Read)?;
    let mut json = String::new();
    file.read_to_string(&mut json)
        .map_err(|e| RecorderError::medium("failed to read stats sidecar", e))?;
    serde_json::from_str(&json)
        .map_err(|e| RecorderError::Medium(format!("failed to parse stats sidecar: {e}")))
}

/// SHA-256 hex digest of a file on the medium.
pub fn checksum(medium: &mut dyn StorageMedium, path: &str) -> Result<String, RecorderError> {
    let mut file = medium.open(path, OpenMode::Read)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .map_err(|e| RecorderError::medium(&format!("failed to read {path} for checksum"), e))?;
    let digest = Sha256::digest(&contents);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

fn sidecar_path(recording_path: &str) -> String {
    match recording_path.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.stats.json"),
        None => format!("{recording_path}.stats.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fs::FsMedium;

    #[test]
    fn sidecar_path_replaces_extension() {
        assert_eq!(
            sidecar_path("/20260827_09-00-00.wav"),
            "/20260827_09-00-00.stats.json"
        );
        assert_eq!(sidecar_path("/plain"), "/plain.stats.json");
    }

    #[test]
    fn sidecar_roundtrip() {
        let root = std::env::temp_dir().join("field_recorder_stats_roundtrip");
        std::fs::remove_dir_all(&root).ok();
        let mut medium = FsMedium::new(root.clone());
        medium.mount().unwrap();

        let stats = SessionStats::new("/a.wav", 5, 300_123, 1024, 2, None);
        write_sidecar(&mut medium, "/a.wav", &stats).unwrap();
        let loaded = read_sidecar(&mut medium, "/a.wav").unwrap();
        assert_eq!(loaded, stats);

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn checksum_is_stable_hex() {
        let root = std::env::temp_dir().join("field_recorder_stats_checksum");
        std::fs::remove_dir_all(&root).ok();
        let mut medium = FsMedium::new(root.clone());
        medium.mount().unwrap();

        {
            use std::io::Write;
            let mut f = medium.open("/a.bin", OpenMode::Create).unwrap();
            f.write_all(b"abc").unwrap();
        }

        let digest = checksum(&mut medium, "/a.bin").unwrap();
        // Well-known SHA-256 of "abc".
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        std::fs::remove_dir_all(root).ok();
    }
}
