use thiserror::Error;

/// Errors surfaced by the capture controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("device not available")]
    DeviceUnavailable,

    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("recording not found")]
    NotFound,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("finalize failed: {0}")]
    Finalize(#[from] FinalizeError),

    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Errors from turning a spool file into a WAV artifact.
///
/// Any of these leaves the previous artifact untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FinalizeError {
    #[error("spool file unreadable: {0}")]
    SourceUnreadable(String),

    #[error("destination unwritable: {0}")]
    DestUnwritable(String),

    #[error("payload of {0} bytes does not fit a WAV length field")]
    PayloadTooLarge(u64),
}

/// Result of a single device read that produced no samples.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// Transient; the frame is dropped and capture continues.
    #[error("invalid read operation")]
    InvalidOperation,

    /// The stream is gone; capture cannot continue.
    #[error("device disconnected: {0}")]
    Disconnected(String),
}
