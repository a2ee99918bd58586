//! Streams a spooled media file as a response body and deletes it afterwards.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use ftm_core::pipeline::DownloadedFile;
use tempfile::TempPath;
use tokio::io::{AsyncRead, ReadBuf};

/// Async reader over a spool file. The file is removed when the reader is
/// dropped, whether the client read it to the end or went away.
pub struct SpooledReader {
    file: tokio::fs::File,
    _path: TempPath,
}

impl SpooledReader {
    pub fn open(file: DownloadedFile) -> io::Result<Self> {
        let (file, path) = file.into_reader()?;
        Ok(Self {
            file: tokio::fs::File::from_std(file),
            _path: path,
        })
    }
}

impl AsyncRead for SpooledReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}
