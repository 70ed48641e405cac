use std::fs::File;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::audio_models::{CaptureStats, RecordingInfo, StopReason};
use crate::models::config::{CaptureConfiguration, WriteFailurePolicy};
use crate::models::error::{CaptureError, ReadError};
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::processing::wav_format::{WavHeader, WAV_HEADER_SIZE};
use crate::storage::finalizer::WavFinalizer;
use crate::storage::paths::{remove_if_exists, RecorderPaths};
use crate::storage::spool_writer::SpoolWriter;
use crate::traits::audio_input::{AudioInputDevice, AudioInputStream};
use crate::traits::capture_delegate::CaptureDelegate;

/// State shared between the controller and the producer thread.
///
/// `active` is the only loop-termination signal: the controller clears it to
/// stop, the producer clears it on ceiling, device loss or aborting write.
struct SessionShared {
    active: AtomicBool,
    bytes_written: AtomicU64,
}

/// A live capture session. Exists from `start_capture` until `stop_capture`.
struct ActiveSession {
    shared: Arc<SessionShared>,
    producer: thread::JoinHandle<ProducerExit>,
}

/// What the producer hands back when it exits. The stream comes back so the
/// controller can stop and release it after the join.
struct ProducerExit {
    stream: Box<dyn AudioInputStream>,
    stats: CaptureStats,
    spool_closed: Result<u64, CaptureError>,
}

/// Observable status, kept separate from the session lock so observers never
/// wait on a join.
struct Status {
    state: CaptureState,
    shared: Option<Arc<SessionShared>>,
}

/// Controls bounded voice-clip capture and hands the spool to the finalizer.
///
/// Data flow:
/// ```text
/// [AudioInputDevice] → producer thread → [spool: raw PCM]
///                                              ↓ stop_capture (after join)
///                                        [WavFinalizer] → [artifact .wav]
/// ```
///
/// Every operation takes `&self`; an internal lock serializes start, stop
/// and drop, so the controller can be shared behind an `Arc`.
pub struct CaptureController<D: AudioInputDevice> {
    device: D,
    config: CaptureConfiguration,
    finalizer: WavFinalizer,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    session: Mutex<Option<ActiveSession>>,
    status: Mutex<Status>,
}

impl<D: AudioInputDevice> CaptureController<D> {
    pub fn new(device: D, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self {
            device,
            finalizer: WavFinalizer::new(config.format),
            config,
            delegate: None,
            session: Mutex::new(None),
            status: Mutex::new(Status {
                state: CaptureState::Idle,
                shared: None,
            }),
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn paths(&self) -> &RecorderPaths {
        &self.config.paths
    }

    pub fn state(&self) -> CaptureState {
        let status = self.status.lock();
        match (status.state, &status.shared) {
            (CaptureState::Recording { .. }, Some(shared)) => CaptureState::Recording {
                bytes_written: shared.bytes_written.load(Ordering::SeqCst),
            },
            (state, _) => state,
        }
    }

    /// Whether the producer is still capturing. False once a session has hit
    /// its ceiling, even before `stop_capture` is called.
    pub fn is_capturing(&self) -> bool {
        self.status
            .lock()
            .shared
            .as_ref()
            .map(|s| s.active.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Bytes spooled by the current session, 0 when idle.
    pub fn bytes_written(&self) -> u64 {
        self.status
            .lock()
            .shared
            .as_ref()
            .map(|s| s.bytes_written.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.config.format.duration_for_bytes(self.bytes_written())
    }

    /// Start capturing. Transitions: idle → recording.
    pub fn start_capture(&self) -> Result<(), CaptureError> {
        let mut slot = self.session.lock();
        if slot.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let format = self.config.format;
        let frame_bytes = self
            .config
            .resolve_frame_buffer_size(self.device.min_buffer_size(&format));
        self.config
            .check_length_headroom(frame_bytes)
            .map_err(CaptureError::ConfigurationFailed)?;

        self.config
            .paths
            .ensure_dirs()
            .map_err(|e| CaptureError::Storage(format!("failed to create directory: {}", e)))?;
        let spool = SpoolWriter::create(self.config.paths.spool())?;

        let stream = match self.device.open(&format, frame_bytes) {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("Failed to open {}: {}", self.device.describe(), e);
                drop(spool);
                self.remove_spool();
                return Err(e);
            }
        };

        log::info!(
            "Capture started on {}: {} Hz, {} ch, {}-bit, frame {} bytes, ceiling {} bytes",
            self.device.describe(),
            format.sample_rate,
            format.channels,
            format.bits_per_sample,
            frame_bytes,
            self.config.byte_ceiling
        );

        let shared = Arc::new(SessionShared {
            active: AtomicBool::new(true),
            bytes_written: AtomicU64::new(0),
        });
        let limits = ProducerLimits {
            frame_bytes,
            byte_ceiling: self.config.byte_ceiling,
            write_failure_policy: self.config.write_failure_policy,
            max_consecutive_read_errors: self.config.max_consecutive_read_errors,
        };
        let producer_shared = Arc::clone(&shared);
        let delegate = self.delegate.clone();

        // The closure owns the stream; if spawning fails it is dropped, which
        // releases the device.
        let producer = thread::Builder::new()
            .name("clip-capture-producer".into())
            .spawn(move || run_producer(stream, spool, producer_shared, limits, delegate))
            .map_err(|e| {
                self.remove_spool();
                CaptureError::Unknown(format!("failed to spawn producer thread: {}", e))
            })?;

        *slot = Some(ActiveSession {
            shared: Arc::clone(&shared),
            producer,
        });
        {
            let mut status = self.status.lock();
            status.state = CaptureState::Recording { bytes_written: 0 };
            status.shared = Some(shared);
        }
        drop(slot);

        self.notify_state(CaptureState::Recording { bytes_written: 0 });
        Ok(())
    }

    /// Stop capturing and finalize the artifact.
    /// Transitions: recording → finalizing → idle.
    ///
    /// The spool is deleted whether or not finalizing succeeds.
    pub fn stop_capture(&self) -> Result<RecordingResult, CaptureError> {
        let outcome = {
            let mut slot = self.session.lock();
            let session = slot.take().ok_or(CaptureError::NotRecording)?;

            session.shared.active.store(false, Ordering::SeqCst);
            let joined = session.producer.join();

            self.status.lock().state = CaptureState::Finalizing;

            let outcome = match joined {
                Ok(exit) => {
                    let ProducerExit {
                        mut stream,
                        stats,
                        spool_closed,
                    } = exit;
                    stream.stop();
                    drop(stream);

                    if let Err(e) = spool_closed {
                        // Whatever reached the file is still finalized.
                        log::error!("Spool did not close cleanly: {}", e);
                    }
                    self.finalize_spool(stats)
                }
                Err(_) => Err(CaptureError::Unknown("capture thread panicked".into())),
            };

            self.remove_spool();
            let mut status = self.status.lock();
            status.state = CaptureState::Idle;
            status.shared = None;
            outcome
        };

        // The session lock is released: the delegate may start the next clip.
        self.notify_state(CaptureState::Finalizing);
        self.notify_state(CaptureState::Idle);
        if let Some(ref delegate) = self.delegate {
            match &outcome {
                Ok(result) => delegate.on_capture_finished(result),
                Err(e) => delegate.on_error(e),
            }
        }

        outcome
    }

    /// Delete the finished recording. Does not touch a session in progress.
    pub fn discard(&self) -> Result<(), CaptureError> {
        let artifact = self.config.paths.artifact();
        match remove_if_exists(artifact) {
            Ok(true) => {
                log::info!("Discarded recording {:?}", artifact);
                Ok(())
            }
            Ok(false) => Err(CaptureError::NotFound),
            Err(e) => Err(CaptureError::Storage(format!("failed to delete recording: {}", e))),
        }
    }

    /// Header details of the recording on disk, or None if there is none.
    pub fn existing_recording(&self) -> Result<Option<RecordingInfo>, CaptureError> {
        let artifact = self.config.paths.artifact();
        let mut file = match File::open(artifact) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CaptureError::Storage(format!("failed to open recording: {}", e))),
        };

        let mut bytes = [0u8; WAV_HEADER_SIZE];
        file.read_exact(&mut bytes)
            .map_err(|e| CaptureError::Storage(format!("failed to read recording header: {}", e)))?;
        let header = WavHeader::parse(&bytes)
            .map_err(|e| CaptureError::Storage(format!("invalid recording: {}", e)))?;

        Ok(Some(RecordingInfo {
            file_path: artifact.to_path_buf(),
            data_bytes: header.data_size,
            format: header.format,
            duration_secs: header.format.duration_for_bytes(header.data_size as u64),
        }))
    }

    // --- Internal helpers ---

    fn finalize_spool(&self, stats: CaptureStats) -> Result<RecordingResult, CaptureError> {
        let paths = &self.config.paths;
        let finalized = self.finalizer.finalize(paths.spool(), paths.artifact())?;
        log::info!(
            "Recording saved to {:?}: {} bytes, stopped by {:?}",
            finalized.path,
            finalized.data_bytes,
            stats.stop_reason
        );

        let duration = self.config.format.duration_for_bytes(finalized.data_bytes);
        Ok(RecordingResult::new(
            finalized.path,
            finalized.data_bytes,
            duration,
            finalized.checksum,
            stats,
        ))
    }

    fn remove_spool(&self) {
        let spool = self.config.paths.spool();
        if let Err(e) = remove_if_exists(spool) {
            log::warn!("Failed to delete spool {:?}: {}", spool, e);
        }
    }

    fn notify_state(&self, state: CaptureState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&state);
        }
    }
}

impl<D: AudioInputDevice> Drop for CaptureController<D> {
    /// Tear down a live session without finalizing it.
    fn drop(&mut self) {
        let Some(session) = self.session.get_mut().take() else {
            return;
        };
        log::warn!("Capture controller dropped while recording; discarding spool");
        session.shared.active.store(false, Ordering::SeqCst);
        if let Ok(mut exit) = session.producer.join() {
            exit.stream.stop();
        }
        self.remove_spool();
    }
}

#[derive(Debug, Clone, Copy)]
struct ProducerLimits {
    frame_bytes: usize,
    byte_ceiling: u64,
    write_failure_policy: WriteFailurePolicy,
    max_consecutive_read_errors: Option<u32>,
}

/// Destination for captured frames.
trait FrameSink {
    fn append(&mut self, data: &[u8]) -> Result<(), CaptureError>;
}

impl FrameSink for SpoolWriter {
    fn append(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        SpoolWriter::append(self, data)
    }
}

/// Producer thread body: pump frames into the spool, then close it.
fn run_producer(
    mut stream: Box<dyn AudioInputStream>,
    mut spool: SpoolWriter,
    shared: Arc<SessionShared>,
    limits: ProducerLimits,
    delegate: Option<Arc<dyn CaptureDelegate>>,
) -> ProducerExit {
    let stats = capture_loop(stream.as_mut(), &mut spool, &shared, limits, delegate.as_deref());
    let spool_closed = spool.close();
    log::debug!(
        "Producer exited: {} bytes in {} frames, {} skipped, {} write failures",
        stats.bytes_written,
        stats.frames_written,
        stats.frames_skipped,
        stats.write_failures
    );
    ProducerExit {
        stream,
        stats,
        spool_closed,
    }
}

/// Read frames while `shared.active` holds.
///
/// Empty and invalid-operation reads drop the frame and count toward the
/// read-error threshold; the ceiling is checked after each write, so at most
/// one frame lands past it.
fn capture_loop(
    stream: &mut dyn AudioInputStream,
    sink: &mut dyn FrameSink,
    shared: &SessionShared,
    limits: ProducerLimits,
    delegate: Option<&dyn CaptureDelegate>,
) -> CaptureStats {
    let mut buf = vec![0u8; limits.frame_bytes];
    let mut stats = CaptureStats::new();
    let mut consecutive_invalid = 0u32;

    let end = |stats: &mut CaptureStats, reason: StopReason| {
        stats.stop_reason = reason;
        shared.active.store(false, Ordering::SeqCst);
    };

    while shared.active.load(Ordering::SeqCst) {
        let read = match stream.read(&mut buf) {
            Ok(read) if read > 0 => {
                consecutive_invalid = 0;
                read.min(buf.len())
            }
            Ok(_) | Err(ReadError::InvalidOperation) => {
                stats.frames_skipped += 1;
                consecutive_invalid += 1;
                let exhausted = limits
                    .max_consecutive_read_errors
                    .is_some_and(|limit| consecutive_invalid >= limit);
                if exhausted {
                    log::error!("{} consecutive failed reads; giving up on device", consecutive_invalid);
                    end(&mut stats, StopReason::DeviceLost);
                    if let Some(d) = delegate {
                        d.on_error(&CaptureError::DeviceUnavailable);
                    }
                }
                continue;
            }
            Err(ReadError::Disconnected(reason)) => {
                log::error!("Input device lost: {}", reason);
                end(&mut stats, StopReason::DeviceLost);
                if let Some(d) = delegate {
                    d.on_error(&CaptureError::DeviceUnavailable);
                }
                continue;
            }
        };

        match sink.append(&buf[..read]) {
            Ok(()) => {
                stats.frames_written += 1;
                stats.bytes_written += read as u64;
                let total = shared.bytes_written.fetch_add(read as u64, Ordering::SeqCst) + read as u64;
                if total > limits.byte_ceiling {
                    log::info!("Byte ceiling reached: {} > {}", total, limits.byte_ceiling);
                    end(&mut stats, StopReason::ByteCeiling);
                }
            }
            Err(e) => {
                stats.write_failures += 1;
                log::error!("Failed to write audio data: {}", e);
                if let Some(d) = delegate {
                    d.on_error(&e);
                }
                if limits.write_failure_policy == WriteFailurePolicy::Abort {
                    end(&mut stats, StopReason::WriteFailed);
                }
            }
        }
    }

    stats
}
