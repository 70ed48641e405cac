use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Highest sample rate accepted by [`AudioFormatSpec::validate`].
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Sample encoding of the captured stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    /// Signed linear PCM, little-endian, interleaved.
    PcmSigned,
}

/// Fixed audio format shared by the capture device and the WAV header.
///
/// Both sides of the pipeline must read the same value: a device configured
/// at one rate and a header written at another yields a valid but garbled file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormatSpec {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub encoding: SampleEncoding,
}

impl AudioFormatSpec {
    /// 44.1 kHz, 16-bit, stereo signed PCM.
    pub const VOICE_CLIP: Self = Self {
        sample_rate: 44_100,
        bits_per_sample: 16,
        channels: 2,
        encoding: SampleEncoding::PcmSigned,
    };

    /// Bytes per second of audio: `bits * rate * channels / 8`.
    ///
    /// Saturates instead of wrapping for formats that fail `validate`.
    pub fn byte_rate(&self) -> u32 {
        let rate = self.bits_per_sample as u64 * self.sample_rate as u64 * self.channels as u64 / 8;
        u32::try_from(rate).unwrap_or(u32::MAX)
    }

    /// Bytes per multi-channel sample frame.
    pub fn block_align(&self) -> u16 {
        let align = self.channels as u32 * self.bits_per_sample as u32 / 8;
        u16::try_from(align).unwrap_or(u16::MAX)
    }

    /// Playback duration of `bytes` of payload in this format.
    pub fn duration_for_bytes(&self, bytes: u64) -> f64 {
        let rate = self.byte_rate();
        if rate == 0 {
            return 0.0;
        }
        bytes as f64 / rate as f64
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(format!("unsupported sample rate: {}", self.sample_rate));
        }
        if ![8, 16, 24, 32].contains(&self.bits_per_sample) {
            return Err(format!("unsupported bit depth: {}", self.bits_per_sample));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        Ok(())
    }
}

impl Default for AudioFormatSpec {
    fn default() -> Self {
        Self::VOICE_CLIP
    }
}

/// Why the producer loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The caller asked for the stop.
    Requested,
    /// Cumulative bytes passed the configured ceiling.
    ByteCeiling,
    /// The device disconnected or kept failing reads.
    DeviceLost,
    /// A spool write failed under `WriteFailurePolicy::Abort`.
    WriteFailed,
}

/// Counters reported by the producer when it exits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStats {
    pub bytes_written: u64,
    pub frames_written: u64,
    pub frames_skipped: u64,
    pub write_failures: u64,
    pub stop_reason: StopReason,
}

impl CaptureStats {
    pub(crate) fn new() -> Self {
        Self {
            bytes_written: 0,
            frames_written: 0,
            frames_skipped: 0,
            write_failures: 0,
            stop_reason: StopReason::Requested,
        }
    }
}

/// Details of the recording currently on disk, read back from its header.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingInfo {
    pub file_path: PathBuf,
    pub data_bytes: u32,
    pub format: AudioFormatSpec,
    pub duration_secs: f64,
}
