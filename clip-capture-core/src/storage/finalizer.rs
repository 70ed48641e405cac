use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::audio_models::AudioFormatSpec;
use crate::models::error::FinalizeError;
use crate::processing::wav_format::{self, WAV_HEADER_SIZE};
use crate::storage::paths::remove_if_exists;

/// A WAV artifact written by [`WavFinalizer::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedWav {
    pub path: PathBuf,
    pub data_bytes: u64,
    /// Lowercase hex SHA-256 of the complete file.
    pub checksum: String,
}

/// Turns a headerless PCM spool into a WAV file.
///
/// Output goes to a staging file next to the destination and is renamed over
/// it only once complete, so a failure never leaves a partial artifact and
/// never destroys the previous one.
///
/// ```text
/// [spool: raw PCM] → [44-byte header | PCM copy] → staging → rename → dest
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WavFinalizer {
    format: AudioFormatSpec,
}

impl WavFinalizer {
    pub fn new(format: AudioFormatSpec) -> Self {
        Self { format }
    }

    /// Write `dest_path` as a WAV holding exactly the bytes of `spool_path`.
    ///
    /// The spool is left in place.
    pub fn finalize(&self, spool_path: &Path, dest_path: &Path) -> Result<FinalizedWav, FinalizeError> {
        let spool = File::open(spool_path)
            .map_err(|e| FinalizeError::SourceUnreadable(format!("{}: {}", spool_path.display(), e)))?;
        let total_audio_len = spool
            .metadata()
            .map_err(|e| FinalizeError::SourceUnreadable(e.to_string()))?
            .len();

        let total_data_len = wav_format::riff_chunk_size(total_audio_len)
            .ok_or(FinalizeError::PayloadTooLarge(total_audio_len))?;
        log::info!(
            "Finalizing WAV: {} payload bytes, RIFF chunk size {}",
            total_audio_len,
            total_data_len
        );

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FinalizeError::DestUnwritable(format!("failed to create directory: {}", e)))?;
        }

        let staging_path = staging_path_for(dest_path);
        let staged = File::create(&staging_path)
            .map_err(|e| FinalizeError::DestUnwritable(format!("{}: {}", staging_path.display(), e)));

        let result = staged.and_then(|file| {
            let checksum = self.write_wav(spool, total_audio_len, file)?;
            fs::rename(&staging_path, dest_path)
                .map_err(|e| FinalizeError::DestUnwritable(format!("failed to replace artifact: {}", e)))?;
            Ok(checksum)
        });

        match result {
            Ok(checksum) => Ok(FinalizedWav {
                path: dest_path.to_path_buf(),
                data_bytes: total_audio_len,
                checksum,
            }),
            Err(e) => {
                if let Err(cleanup) = remove_if_exists(&staging_path) {
                    log::warn!("Failed to remove staging file {:?}: {}", staging_path, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Header, then exactly `data_len` payload bytes, then flush and sync.
    fn write_wav(&self, spool: File, data_len: u64, out: File) -> Result<String, FinalizeError> {
        // riff_chunk_size already proved data_len fits.
        let header = wav_format::generate_wav_header(&self.format, data_len as u32);

        let mut writer = HashingWriter::new(BufWriter::new(out));
        writer
            .write_all(&header)
            .map_err(|e| FinalizeError::DestUnwritable(e.to_string()))?;

        let mut payload = BufReader::new(spool).take(data_len);
        let copied = copy_payload(&mut payload, &mut writer)?;
        if copied != data_len {
            return Err(FinalizeError::SourceUnreadable(format!(
                "spool shrank during finalize: expected {} bytes, read {}",
                data_len, copied
            )));
        }

        let (buffered, checksum) = writer.finish();
        let file = buffered
            .into_inner()
            .map_err(|e| FinalizeError::DestUnwritable(e.error().to_string()))?;
        file.sync_all()
            .map_err(|e| FinalizeError::DestUnwritable(e.to_string()))?;

        log::debug!("Wrote {} bytes of WAV", WAV_HEADER_SIZE as u64 + copied);
        Ok(checksum)
    }
}

/// Copy, attributing read failures to the spool and write failures to the
/// destination.
fn copy_payload<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> Result<u64, FinalizeError> {
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FinalizeError::SourceUnreadable(e.to_string())),
        };
        writer
            .write_all(&buf[..n])
            .map_err(|e| FinalizeError::DestUnwritable(e.to_string()))?;
        total += n as u64;
    }
}

fn staging_path_for(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".into());
    dest.with_file_name(format!("{}.{}.partial", name, uuid::Uuid::new_v4()))
}

/// Writer adapter that hashes everything passing through it.
struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finish(self) -> (W, String) {
        (self.inner, hex_encode(&self.hasher.finalize()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
