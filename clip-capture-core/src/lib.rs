//! # clip-capture-core
//!
//! Platform-agnostic core for recording one fixed-format voice clip.
//!
//! A producer thread reads PCM frames from an `AudioInputDevice` into a
//! headerless spool file until the caller stops it or a byte ceiling is
//! crossed; stopping joins the producer and finalizes the spool into a
//! canonical 44-byte-header WAV file, replacing the previous recording.
//! Platform backends (Android via cpal) implement `AudioInputDevice` and
//! plug into the generic `CaptureController`.
//!
//! ## Architecture
//!
//! ```text
//! clip-capture-core (this crate)
//! ├── traits/       ← AudioInputDevice, AudioInputStream, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, AudioFormatSpec, etc.
//! ├── processing/   ← WAV header generation and parsing
//! ├── session/      ← CaptureController (start / stop / discard)
//! └── storage/      ← SpoolWriter, WavFinalizer, RecorderPaths
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioFormatSpec, CaptureStats, RecordingInfo, SampleEncoding, StopReason};
pub use models::config::{CaptureConfiguration, WriteFailurePolicy};
pub use models::error::{CaptureError, FinalizeError, ReadError};
pub use models::recording_result::RecordingResult;
pub use models::state::CaptureState;
pub use processing::wav_format::{WavHeader, WavHeaderError};
pub use session::controller::CaptureController;
pub use storage::finalizer::{FinalizedWav, WavFinalizer};
pub use storage::paths::RecorderPaths;
pub use storage::spool_writer::SpoolWriter;
pub use traits::audio_input::{AudioInputDevice, AudioInputStream};
pub use traits::capture_delegate::CaptureDelegate;
