use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for capture notifications.
///
/// `on_error` may be called from the producer thread; everything else is
/// called from whichever thread invoked the controller, after the controller
/// has released its session lock. `on_state_changed` and
/// `on_capture_finished` may therefore start or stop a session. Calls from
/// the producer thread must not: `stop_capture` joins that thread.
/// Implementations should marshal to the UI thread if needed.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the controller state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called for spool write failures and device loss during capture.
    fn on_error(&self, error: &CaptureError);

    /// Called when the artifact has been finalized.
    fn on_capture_finished(&self, result: &RecordingResult);
}
