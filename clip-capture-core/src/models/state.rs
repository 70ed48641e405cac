/// Capture controller state machine.
///
/// State transitions:
/// ```text
/// idle → recording → finalizing → idle
/// ```
///
/// There is no paused state. A session whose producer stopped on its own
/// (byte ceiling, device loss) stays `Recording` until `stop_capture`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording { bytes_written: u64 },
    Finalizing,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }
}
