//! # clip-capture-android
//!
//! Android microphone backend for clip-capture.
//!
//! Provides:
//! - `CpalMicrophone`: default input device via cpal (AAudio/OpenSL ES),
//!   implementing `AudioInputDevice`
//! - `chunk_reader`: turns callback chunks into blocking frame reads
//!
//! Microphone permission (`RECORD_AUDIO`) must be granted by the app before
//! `start_capture`; an ungranted permission surfaces as `DeviceUnavailable`.
//!
//! ## Usage
//! ```ignore
//! use clip_capture_android::CpalMicrophone;
//! use clip_capture_core::{CaptureConfiguration, CaptureController};
//!
//! let mic = CpalMicrophone::default_device()?;
//! let config = CaptureConfiguration::with_cache_root(cache_dir);
//! let controller = CaptureController::new(mic, config)?;
//! controller.start_capture()?;
//! // ...
//! let recording = controller.stop_capture()?;
//! ```

pub mod chunk_reader;

#[cfg(target_os = "android")]
pub mod cpal_mic;

#[cfg(target_os = "android")]
pub use cpal_mic::CpalMicrophone;
