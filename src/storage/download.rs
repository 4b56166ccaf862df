//! Delivery of downloaded reports.
//!
//! A sink receives the complete response body only after the HTTP request
//! succeeded, so a failed request never leaves anything behind.

use super::Result;
use crate::error::StorageError;
use crate::map_io_error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Destination for a downloaded file.
pub trait DownloadSink: Send + Sync {
    /// Store `bytes` under `file_name` and return where it ended up.
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes downloads into a directory.
///
/// Bytes are staged in a temporary file inside the target directory and
/// renamed into place once fully written. The staged file is removed when
/// anything fails, so at most one finished file appears per download.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(StorageError::FileIo {
                path: file_name.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "download file name must be a single path segment",
                ),
            });
        }

        map_io_error!(fs::create_dir_all(&self.dir), &self.dir)?;
        if !self.dir.is_dir() {
            return Err(StorageError::DownloadDirNotFound);
        }

        let mut staged = map_io_error!(NamedTempFile::new_in(&self.dir), &self.dir)?;
        map_io_error!(staged.write_all(bytes), staged.path())?;
        map_io_error!(staged.flush(), staged.path())?;

        let target = self.dir.join(file_name);
        staged
            .persist(&target)
            .map_err(|e| crate::utils::error_helpers::convert_io_error(e.error, &target))?;

        log::debug!("wrote {} bytes to {}", bytes.len(), target.display());
        Ok(target)
    }
}
