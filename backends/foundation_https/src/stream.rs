//! Byte-stream primitives the response parser is built on.

use crate::errors::{HttpsCallError, HttpsCallResult};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

const READ_CHUNK_SIZE: usize = 4096;

/// A connected, bidirectional byte stream owned by exactly one call.
pub trait CallStream: Read + Write {
    /// Closes the stream. Callers treat failures as best-effort.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the close could not complete.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl CallStream for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// Buffers reads from a stream until a delimiter is seen.
///
/// Bytes read past the delimiter stay in the buffer and are handed back
/// with [`DelimitedReader::into_parts`].
pub struct DelimitedReader<'a, S: Read + ?Sized> {
    inner: &'a mut S,
    buffer: Vec<u8>,
}

impl<'a, S: Read + ?Sized> DelimitedReader<'a, S> {
    pub fn new(inner: &'a mut S) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Reads until `delimiter` is buffered and returns the length of the
    /// block up to and including it.
    ///
    /// The buffer never grows past `limit` bytes.
    ///
    /// # Errors
    ///
    /// - `HeaderBlockTooLarge` if `limit` bytes are buffered without a delimiter.
    /// - `HeaderBlockIncomplete` if the stream ends first.
    /// - `ReadFailed` for any other I/O error.
    pub fn read_until(&mut self, delimiter: &[u8], limit: usize) -> HttpsCallResult<usize> {
        let mut searched = 0;
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            if let Some(pos) = memchr::memmem::find(&self.buffer[searched..], delimiter) {
                return Ok(searched + pos + delimiter.len());
            }
            // the delimiter may straddle the next read
            searched = self.buffer.len().saturating_sub(delimiter.len().saturating_sub(1));

            let room = limit.saturating_sub(self.buffer.len());
            if room == 0 {
                return Err(HttpsCallError::HeaderBlockTooLarge(limit));
            }

            let want = room.min(READ_CHUNK_SIZE);
            match self.inner.read(&mut chunk[..want]) {
                Ok(0) => return Err(HttpsCallError::HeaderBlockIncomplete),
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(HttpsCallError::HeaderBlockIncomplete)
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(HttpsCallError::ReadFailed(err)),
            }
        }
    }

    /// Returns the buffered bytes, split at `at`.
    #[must_use]
    pub fn into_parts(mut self, at: usize) -> (Vec<u8>, Vec<u8>) {
        let rest = self.buffer.split_off(at.min(self.buffer.len()));
        (self.buffer, rest)
    }
}

/// Reads into `buf` until it is full or the stream ends.
///
/// Returns how many bytes were read; fewer than `buf.len()` means the
/// stream closed early. TLS streams report a peer closing without
/// `close_notify` as `UnexpectedEof`, which counts as the end of stream.
///
/// # Errors
///
/// Returns any I/O error other than `Interrupted`.
pub fn read_full<S: Read + ?Sized>(stream: &mut S, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
