use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::models::error::CaptureError;
use crate::storage::paths::remove_if_exists;

/// Append-only writer for the headerless PCM spool file.
///
/// Owned by the producer thread for the whole session; `close` consumes it,
/// so nothing can be appended after the file is flushed and synced.
pub struct SpoolWriter {
    file: BufWriter<File>,
    bytes_written: u64,
}

impl SpoolWriter {
    /// Create a fresh spool at `path`, replacing any stale one left by an
    /// earlier session.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::Storage(format!("failed to create directory: {}", e)))?;
        }

        if remove_if_exists(&path)
            .map_err(|e| CaptureError::Storage(format!("failed to remove stale spool: {}", e)))?
        {
            log::debug!("Removed stale spool file {:?}", path);
        }

        let file = File::create(&path)
            .map_err(|e| CaptureError::Storage(format!("failed to create spool: {}", e)))?;

        Ok(Self {
            file: BufWriter::new(file),
            bytes_written: 0,
        })
    }

    /// Append raw PCM bytes. Only successfully written bytes are counted.
    pub fn append(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        self.file
            .write_all(data)
            .map_err(|e| CaptureError::Storage(format!("spool write failed: {}", e)))?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Flush, sync to disk and close. Returns the total bytes written.
    pub fn close(self) -> Result<u64, CaptureError> {
        let file = self
            .file
            .into_inner()
            .map_err(|e| CaptureError::Storage(format!("spool flush failed: {}", e.error())))?;
        file.sync_all()
            .map_err(|e| CaptureError::Storage(format!("spool sync failed: {}", e)))?;
        Ok(self.bytes_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_raw_bytes_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("record_temp.wav");

        let mut writer = SpoolWriter::create(&path).unwrap();
        writer.append(&[1, 2, 3, 4]).unwrap();
        writer.append(&[5, 6]).unwrap();

        assert_eq!(writer.close().unwrap(), 6);
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn stale_spool_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record_temp.wav");
        fs::write(&path, vec![0xEE; 128]).unwrap();

        let mut writer = SpoolWriter::create(&path).unwrap();
        writer.append(&[7; 8]).unwrap();
        writer.close().unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![7; 8]);
    }

    #[test]
    fn create_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("RecordTester");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = SpoolWriter::create(blocker.join("record_temp.wav")).err().unwrap();
        assert!(matches!(err, CaptureError::Storage(_)));
    }
}
