//! cpal microphone capture provider.
//!
//! Opens the default input device as a 16-bit stream at the requested rate
//! and channel count. The cpal stream lives on its own thread because
//! `cpal::Stream` is not `Send` on every host; samples cross to the producer
//! over a bounded channel.

use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use parking_lot::Mutex;

use clip_capture_core::{AudioFormatSpec, AudioInputDevice, AudioInputStream, CaptureError, ReadError};

use crate::chunk_reader::{encode_i16_le, ChunkReader};

/// Callback chunks buffered between the audio thread and the producer.
const CHANNEL_DEPTH: usize = 64;

/// How long a read waits for samples before reporting an invalid read.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Default system microphone through cpal.
pub struct CpalMicrophone {
    device_name: String,
}

impl CpalMicrophone {
    /// Use the system default input device.
    pub fn default_device() -> Result<Self, CaptureError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::DeviceUnavailable)?;
        let device_name = device.name().unwrap_or_else(|_| "Default Microphone".into());
        Ok(Self { device_name })
    }
}

impl AudioInputDevice for CpalMicrophone {
    fn min_buffer_size(&self, _format: &AudioFormatSpec) -> Option<usize> {
        // cpal exposes no minimum-buffer query; the core default applies.
        None
    }

    fn open(
        &self,
        format: &AudioFormatSpec,
        frame_bytes: usize,
    ) -> Result<Box<dyn AudioInputStream>, CaptureError> {
        if format.bits_per_sample != 16 {
            return Err(CaptureError::ConfigurationFailed(format!(
                "cpal backend captures 16-bit PCM only, got {}-bit",
                format.bits_per_sample
            )));
        }

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let (sample_tx, sample_rx) = mpsc::sync_channel::<Vec<u8>>(CHANNEL_DEPTH);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), CaptureError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let failure = Arc::new(Mutex::new(None));
        let stream_failure = Arc::clone(&failure);

        let worker = thread::Builder::new()
            .name("cpal-input-stream".into())
            .spawn(move || stream_thread(config, sample_tx, ready_tx, stop_rx, stream_failure))
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn input thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!(
                    "Opened {} at {} Hz, {} ch, reads of {} bytes",
                    self.device_name,
                    format.sample_rate,
                    format.channels,
                    frame_bytes
                );
                Ok(Box::new(CpalInputStream {
                    reader: ChunkReader::new(sample_rx, READ_TIMEOUT),
                    failure,
                    stop_tx: Some(stop_tx),
                    worker: Some(worker),
                }))
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(CaptureError::DeviceUnavailable)
            }
        }
    }

    fn describe(&self) -> String {
        self.device_name.clone()
    }
}

/// Owns the cpal stream from creation to release.
///
/// Sequence:
/// 1. Resolve the default input device
/// 2. Build an i16 input stream for `config`
/// 3. Start it and report readiness
/// 4. Block until the reader signals stop (or goes away), then drop the stream
fn stream_thread(
    config: StreamConfig,
    sample_tx: SyncSender<Vec<u8>>,
    ready_tx: Sender<Result<(), CaptureError>>,
    stop_rx: Receiver<()>,
    failure: Arc<Mutex<Option<String>>>,
) {
    let Some(device) = cpal::default_host().default_input_device() else {
        let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable));
        return;
    };

    let error_slot = Arc::clone(&failure);
    let built = device.build_input_stream(
        &config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| match sample_tx.try_send(encode_i16_le(data)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::warn!("Input queue full; dropping {} samples", data.len()),
            Err(TrySendError::Disconnected(_)) => {}
        },
        move |err| {
            log::error!("Input stream error: {}", err);
            *error_slot.lock() = Some(err.to_string());
        },
        None,
    );

    let stream = match built {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("Failed to build input stream: {}", e);
            let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable));
            return;
        }
    };

    if let Err(e) = stream.play() {
        log::error!("Failed to start input stream: {}", e);
        let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable));
        return;
    }

    if ready_tx.send(Ok(())).is_err() {
        return;
    }

    // Returns on an explicit stop or when the reader is dropped.
    let _ = stop_rx.recv();

    if let Err(e) = stream.pause() {
        log::warn!("Failed to pause input stream: {}", e);
    }
    drop(stream);
    log::debug!("Input stream released");
}

struct CpalInputStream {
    reader: ChunkReader,
    failure: Arc<Mutex<Option<String>>>,
    stop_tx: Option<Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AudioInputStream for CpalInputStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        if let Some(reason) = self.failure.lock().take() {
            return Err(ReadError::Disconnected(reason));
        }
        self.reader.fill(buf)
    }

    fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CpalInputStream {
    fn drop(&mut self) {
        self.stop();
    }
}
