//! Where the resolved media lives.

use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

/// A direct link, or a file already downloaded into a spool file.
#[derive(Debug)]
pub enum MediaLocator {
    Link(String),
    File(DownloadedFile),
}

impl MediaLocator {
    pub fn link(&self) -> Option<&str> {
        match self {
            MediaLocator::Link(url) => Some(url),
            MediaLocator::File(_) => None,
        }
    }
}

/// Media bytes spooled to a temporary file.
///
/// The file is deleted when this value (or the [`TempPath`] handed out by
/// [`DownloadedFile::into_reader`]) is dropped, unless it is persisted.
#[derive(Debug)]
pub struct DownloadedFile {
    file: NamedTempFile,
    filename: String,
    len: u64,
}

impl DownloadedFile {
    pub(crate) fn new(file: NamedTempFile, filename: String, len: u64) -> Self {
        Self {
            file,
            filename,
            len,
        }
    }

    /// Sanitized name to save or serve the file under.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current (temporary) location of the bytes.
    pub fn spool_path(&self) -> &Path {
        self.file.path()
    }

    /// Moves the file to `dir/<filename>`, replacing any existing file.
    /// `dir` should be on the spool's filesystem for this to be a rename.
    pub fn persist_in(self, dir: &Path) -> io::Result<PathBuf> {
        let dest = dir.join(&self.filename);
        self.file.persist(&dest).map_err(|e| e.error)?;
        Ok(dest)
    }

    /// Opens the bytes for reading from the start. The returned path guard
    /// deletes the file when dropped.
    pub fn into_reader(self) -> io::Result<(File, TempPath)> {
        let (mut file, path) = self.file.into_parts();
        file.seek(SeekFrom::Start(0))?;
        Ok((file, path))
    }
}
