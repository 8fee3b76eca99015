//! Byte sources for the scanner.
//!
//! A pack can arrive as a seekable file or as a pure stream (a network
//! socket mid-fetch). Seekability decides how the decoder resolves delta
//! bases, so the capability is part of the source's type.

use std::io::{self, Read, Seek, SeekFrom};

/// Input for a [`Scanner`](crate::Scanner).
pub trait PackSource: Read {
    /// Whether [`seek_to`](PackSource::seek_to) is supported.
    fn is_seekable(&self) -> bool;

    /// Position the source at an absolute byte offset.
    fn seek_to(&mut self, offset: u64) -> io::Result<u64>;
}

/// A source backed by a `Read + Seek` reader (file, cursor).
pub struct SeekSource<R> {
    inner: R,
}

impl<R: Read + Seek> SeekSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read + Seek> Read for SeekSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Seek> PackSource for SeekSource<R> {
    fn is_seekable(&self) -> bool {
        true
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        self.inner.seek(SeekFrom::Start(offset))
    }
}

/// A forward-only source; seeking always fails.
pub struct StreamSource<R> {
    inner: R,
}

impl<R: Read> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> Read for StreamSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> PackSource for StreamSource<R> {
    fn is_seekable(&self) -> bool {
        false
    }

    fn seek_to(&mut self, _offset: u64) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "source does not support seeking",
        ))
    }
}
