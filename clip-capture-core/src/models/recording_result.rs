use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::CaptureStats;

/// Result returned when `stop_capture` has produced a new artifact.
///
/// Serializable so a UI bridge can forward it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub data_bytes: u64,
    pub duration_secs: f64,
    /// Lowercase hex SHA-256 of the whole artifact, header included.
    pub checksum: String,
    pub created_at: String,
    pub stats: CaptureStats,
}

impl RecordingResult {
    pub(crate) fn new(
        file_path: PathBuf,
        data_bytes: u64,
        duration_secs: f64,
        checksum: String,
        stats: CaptureStats,
    ) -> Self {
        Self {
            file_path,
            data_bytes,
            duration_secs,
            checksum,
            created_at: chrono::Utc::now().to_rfc3339(),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::StopReason;

    #[test]
    fn serializes_for_ui_bridge() {
        let stats = CaptureStats {
            bytes_written: 1000,
            frames_written: 2,
            frames_skipped: 1,
            write_failures: 0,
            stop_reason: StopReason::ByteCeiling,
        };
        let result = RecordingResult::new(
            PathBuf::from("/cache/RecordTester/record_fix.wav"),
            1000,
            0.5,
            "ab".repeat(32),
            stats,
        );

        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["data_bytes"], 1000);
        assert_eq!(json["stats"]["stop_reason"], "byte_ceiling");
        assert!(chrono::DateTime::parse_from_rfc3339(json["created_at"].as_str().unwrap()).is_ok());

        let back: RecordingResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
