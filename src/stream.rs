//! The stream adapter: a thin abstraction over a seekable byte sink/source.
//!
//! Supplied by the caller for one top-level pack or unpack call; the engine
//! never closes or reopens it. Anything that is `Read + Write + Seek` works
//! out of the box (files, `Cursor<Vec<u8>>`); the engine also creates its
//! own in-memory cursor when the caller wants plain bytes back.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Position query, absolute seek, relative skip, read and write.
pub trait Stream {
    /// Current absolute position.
    fn tell(&mut self) -> io::Result<u64>;
    /// Seeks to an absolute position; returns the new position.
    fn seek_to(&mut self, pos: u64) -> io::Result<u64>;
    /// Moves relative to the current position; returns the new position.
    fn skip(&mut self, delta: i64) -> io::Result<u64>;
    /// Reads up to `n` bytes; a shorter result means the stream ended.
    fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>>;
    /// Writes the whole buffer.
    fn write_all_bytes(&mut self, buf: &[u8]) -> io::Result<()>;
}

impl<T: Read + Write + Seek> Stream for T {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn seek_to(&mut self, pos: u64) -> io::Result<u64> {
        self.seek(SeekFrom::Start(pos))
    }

    fn skip(&mut self, delta: i64) -> io::Result<u64> {
        self.seek(SeekFrom::Current(delta))
    }

    fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn write_all_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }
}
