use crate::models::audio_models::AudioFormatSpec;
use crate::processing::wav_format::RIFF_HEADER_OVERHEAD;
use crate::storage::paths::RecorderPaths;

/// Spool ceiling: roughly 2.8 seconds of 44.1 kHz 16-bit stereo.
pub const DEFAULT_BYTE_CEILING: u64 = 500_000;

/// Frame buffer size used when the device has no minimum-buffer query.
pub const DEFAULT_FRAME_BUFFER_BYTES: usize = 4096;

/// Consecutive invalid-operation reads tolerated before the device is
/// considered lost.
pub const DEFAULT_MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// What the producer does when appending to the spool fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Log, report to the delegate, drop the frame and keep capturing.
    #[default]
    Continue,
    /// End the session; whatever was already spooled is still finalized.
    Abort,
}

/// Configuration for a capture controller.
#[derive(Debug, Clone)]
pub struct CaptureConfiguration {
    /// Format requested from the device and written into the WAV header.
    pub format: AudioFormatSpec,

    /// Spool and artifact locations.
    pub paths: RecorderPaths,

    /// Capture stops once cumulative spooled bytes exceed this value.
    pub byte_ceiling: u64,

    /// Explicit frame buffer size in bytes, or None to ask the device.
    pub frame_buffer_size: Option<usize>,

    pub write_failure_policy: WriteFailurePolicy,

    /// None never escalates invalid-operation reads.
    pub max_consecutive_read_errors: Option<u32>,
}

impl CaptureConfiguration {
    /// Reference configuration with files under `<cache_root>/RecordTester`.
    pub fn with_cache_root(cache_root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            format: AudioFormatSpec::default(),
            paths: RecorderPaths::under_cache_root(cache_root),
            byte_ceiling: DEFAULT_BYTE_CEILING,
            frame_buffer_size: None,
            write_failure_policy: WriteFailurePolicy::default(),
            max_consecutive_read_errors: Some(DEFAULT_MAX_CONSECUTIVE_READ_ERRORS),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.format.validate()?;
        if self.byte_ceiling == 0 {
            return Err("byte ceiling must be positive".into());
        }
        if self.frame_buffer_size == Some(0) {
            return Err("frame buffer size must be positive".into());
        }
        if self.max_consecutive_read_errors == Some(0) {
            return Err("read error threshold must be positive".into());
        }
        self.check_length_headroom(self.frame_buffer_size.unwrap_or(DEFAULT_FRAME_BUFFER_BYTES))?;
        if self.paths.spool() == self.paths.artifact() {
            return Err("spool and artifact paths must differ".into());
        }
        Ok(())
    }

    /// A session may overshoot the ceiling by one frame; the result must
    /// still fit the WAV length fields.
    pub fn check_length_headroom(&self, frame_bytes: usize) -> Result<(), String> {
        let worst_case = self
            .byte_ceiling
            .saturating_add(frame_bytes as u64)
            .saturating_add(RIFF_HEADER_OVERHEAD as u64);
        if worst_case > u32::MAX as u64 {
            return Err(format!(
                "byte ceiling {} plus a {}-byte frame exceeds the WAV length field",
                self.byte_ceiling, frame_bytes
            ));
        }
        Ok(())
    }

    /// Frame buffer size for a session: explicit override, then the device's
    /// minimum, then the default; rounded up to whole sample frames.
    pub fn resolve_frame_buffer_size(&self, device_minimum: Option<usize>) -> usize {
        let requested = self
            .frame_buffer_size
            .or(device_minimum.filter(|&n| n > 0))
            .unwrap_or(DEFAULT_FRAME_BUFFER_BYTES);
        let align = (self.format.block_align() as usize).max(1);
        requested.div_ceil(align) * align
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_configuration_is_valid() {
        let config = CaptureConfiguration::with_cache_root("/tmp/cache");
        assert!(config.validate().is_ok());
        assert_eq!(config.byte_ceiling, 500_000);
        assert!(config.paths.artifact().ends_with("RecordTester/record_fix.wav"));
    }

    #[test]
    fn rejects_zero_ceiling_and_zero_frames() {
        let mut config = CaptureConfiguration::with_cache_root("/tmp/cache");
        config.byte_ceiling = 0;
        assert!(config.validate().is_err());

        let mut config = CaptureConfiguration::with_cache_root("/tmp/cache");
        config.frame_buffer_size = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_ceiling_past_u32_length() {
        let mut config = CaptureConfiguration::with_cache_root("/tmp/cache");
        config.byte_ceiling = u32::MAX as u64;
        assert!(config.validate().is_err());

        config.byte_ceiling = u32::MAX as u64 - DEFAULT_FRAME_BUFFER_BYTES as u64 - 36;
        assert!(config.validate().is_ok());
        assert!(config.check_length_headroom(DEFAULT_FRAME_BUFFER_BYTES + 4).is_err());
    }

    #[test]
    fn frame_size_precedence_and_alignment() {
        let mut config = CaptureConfiguration::with_cache_root("/tmp/cache");
        assert_eq!(config.resolve_frame_buffer_size(None), DEFAULT_FRAME_BUFFER_BYTES);
        assert_eq!(config.resolve_frame_buffer_size(Some(0)), DEFAULT_FRAME_BUFFER_BYTES);
        assert_eq!(config.resolve_frame_buffer_size(Some(3528)), 3528);
        // Rounded up to the 4-byte block align.
        assert_eq!(config.resolve_frame_buffer_size(Some(3530)), 3532);

        config.frame_buffer_size = Some(8192);
        assert_eq!(config.resolve_frame_buffer_size(Some(3528)), 8192);
    }
}
