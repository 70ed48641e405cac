use crate::models::audio_models::AudioFormatSpec;
use crate::models::error::{CaptureError, ReadError};

/// Interface for platform microphone backends.
///
/// Implemented by:
/// - `CpalMicrophone` (Android, `clip-capture-android`)
/// - scripted in-memory devices in tests
pub trait AudioInputDevice: Send + Sync {
    /// The platform's minimum buffer size in bytes for `format`, if the
    /// platform has such a query.
    fn min_buffer_size(&self, format: &AudioFormatSpec) -> Option<usize>;

    /// Open and start a stream delivering `format` PCM in reads of up to
    /// `frame_bytes` bytes.
    ///
    /// Fails with `CaptureError::DeviceUnavailable` if the device cannot be
    /// opened or ends up in an invalid state.
    fn open(
        &self,
        format: &AudioFormatSpec,
        frame_bytes: usize,
    ) -> Result<Box<dyn AudioInputStream>, CaptureError>;

    /// Human-readable device name for logs.
    fn describe(&self) -> String;
}

/// A started input stream, owned by the producer thread while capturing.
pub trait AudioInputStream: Send {
    /// Read interleaved little-endian PCM into `buf`, blocking for at most
    /// one buffer's worth of audio. Returns the number of bytes filled.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError>;

    /// Stop the hardware stream and release it. Must be idempotent; dropping
    /// the stream releases it as well.
    fn stop(&mut self);
}
