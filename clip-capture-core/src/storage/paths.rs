//! Spool and artifact locations.
//!
//! Files live in `<cache root>/RecordTester/`:
//! `record_temp.wav` holds headerless PCM while capturing (despite the
//! extension), `record_fix.wav` is the finished recording.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const RECORDER_FOLDER: &str = "RecordTester";
pub const SPOOL_FILE_NAME: &str = "record_temp.wav";
pub const ARTIFACT_FILE_NAME: &str = "record_fix.wav";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderPaths {
    spool: PathBuf,
    artifact: PathBuf,
}

impl RecorderPaths {
    pub fn new(spool: impl Into<PathBuf>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            spool: spool.into(),
            artifact: artifact.into(),
        }
    }

    pub fn under_cache_root(cache_root: impl Into<PathBuf>) -> Self {
        let dir = cache_root.into().join(RECORDER_FOLDER);
        Self {
            spool: dir.join(SPOOL_FILE_NAME),
            artifact: dir.join(ARTIFACT_FILE_NAME),
        }
    }

    pub fn spool(&self) -> &Path {
        &self.spool
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Create the parent directories of both files if missing.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        for path in [&self.spool, &self.artifact] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Remove `path`, treating an already-missing file as success.
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
