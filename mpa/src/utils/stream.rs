//! Random-access byte sources.
//!
//! [`ByteStream`] is the only way the parsers touch file data. Every read is
//! bounds checked against the stream size, so a window that runs off either
//! end of the file yields [`MpaError::EndOfStream`] instead of stale bytes.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use log::trace;

use crate::utils::errors::{MpaError, Result};

/// Default size of the read cache kept by [`BufferedStream`].
pub const DEFAULT_CACHE_SIZE: usize = 16 * 1024;

/// A seekable, bounds-checked byte source.
pub trait ByteStream {
    /// Total number of bytes in the stream.
    fn size(&self) -> u64;

    /// Reads `size` bytes starting at `*offset`.
    ///
    /// With `advance` the cursor is moved past the returned bytes, otherwise
    /// it is left untouched. `reverse` hints that the caller is scanning
    /// backward; it only affects how the backing read is positioned.
    fn read_bytes(
        &mut self,
        size: usize,
        offset: &mut u64,
        advance: bool,
        reverse: bool,
    ) -> Result<&[u8]>;

    /// Reads `size` bytes at `offset` without a cursor.
    fn peek(&mut self, size: usize, offset: u64) -> Result<&[u8]> {
        let mut cursor = offset;
        self.read_bytes(size, &mut cursor, false, false)
    }
}

/// Copies a fixed-size window out of a stream.
pub fn peek_array<const N: usize, S>(stream: &mut S, offset: u64, reverse: bool) -> Result<[u8; N]>
where
    S: ByteStream + ?Sized,
{
    let mut cursor = offset;
    let bytes = stream.read_bytes(N, &mut cursor, false, reverse)?;

    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Read-through cache over any `Read + Seek` source.
///
/// Keeps one contiguous window of the source in memory. Requests that fall
/// inside the window are served from it; anything else refills the window
/// starting at (or, for reverse reads, ending at) the requested bytes.
#[derive(Debug)]
pub struct BufferedStream<R> {
    reader: R,
    len: u64,
    cache: Vec<u8>,
    origin: u64,
    cache_size: usize,
}

pub type FileStream = BufferedStream<File>;
pub type SliceStream<'a> = BufferedStream<io::Cursor<&'a [u8]>>;

impl<R> BufferedStream<R>
where
    R: Read + Seek,
{
    pub fn new(reader: R) -> Result<Self> {
        Self::with_cache_size(reader, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(mut reader: R, cache_size: usize) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;

        Ok(Self {
            reader,
            len,
            cache: Vec::with_capacity(cache_size),
            origin: 0,
            cache_size: cache_size.max(1),
        })
    }

    fn cached(&self, offset: u64, size: usize) -> bool {
        offset >= self.origin && offset + size as u64 <= self.origin + self.cache.len() as u64
    }

    fn fill(&mut self, offset: u64, size: usize, reverse: bool) -> io::Result<()> {
        let window = size.max(self.cache_size) as u64;
        let start = if reverse {
            (offset + size as u64).saturating_sub(window)
        } else {
            offset
        };
        let end = (start + window).min(self.len);

        trace!("Filling read cache: {start}..{end} (reverse: {reverse})");

        self.reader.seek(SeekFrom::Start(start))?;
        self.cache.clear();
        self.cache.resize((end - start) as usize, 0);
        self.reader.read_exact(&mut self.cache)?;
        self.origin = start;

        Ok(())
    }
}

impl FileStream {
    /// Opens a file for inspection.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(file)
    }
}

impl<'a> SliceStream<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self {
            reader: io::Cursor::new(buf),
            len: buf.len() as u64,
            cache: Vec::new(),
            origin: 0,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl<R> ByteStream for BufferedStream<R>
where
    R: Read + Seek,
{
    fn size(&self) -> u64 {
        self.len
    }

    fn read_bytes(
        &mut self,
        size: usize,
        offset: &mut u64,
        advance: bool,
        reverse: bool,
    ) -> Result<&[u8]> {
        let start = *offset;
        if start
            .checked_add(size as u64)
            .is_none_or(|end| end > self.len)
        {
            return Err(MpaError::EndOfStream {
                offset: start,
                size,
                len: self.len,
            });
        }

        if !self.cached(start, size) {
            self.fill(start, size, reverse)?;
        }

        if advance {
            *offset += size as u64;
        }

        let at = (start - self.origin) as usize;
        Ok(&self.cache[at..at + size])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn reads_inside_bounds() -> anyhow::Result<()> {
        let data = counting(1000);
        let mut stream = SliceStream::from_slice(&data);

        assert_eq!(stream.size(), 1000);
        assert_eq!(stream.peek(4, 10)?, &data[10..14]);
        assert_eq!(stream.peek(4, 996)?, &data[996..]);
        Ok(())
    }

    #[test]
    fn rejects_windows_past_the_end() {
        let data = counting(100);
        let mut stream = SliceStream::from_slice(&data);

        let err = stream.peek(4, 97).unwrap_err();
        assert!(err.is_end_of_stream());
        assert!(stream.peek(1, 100).unwrap_err().is_end_of_stream());
        assert!(stream.peek(1, u64::MAX).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn advance_moves_cursor_only_when_asked() -> anyhow::Result<()> {
        let data = counting(64);
        let mut stream = SliceStream::from_slice(&data);

        let mut offset = 8;
        stream.read_bytes(4, &mut offset, false, false)?;
        assert_eq!(offset, 8);

        stream.read_bytes(4, &mut offset, true, false)?;
        assert_eq!(offset, 12);
        Ok(())
    }

    #[test]
    fn small_cache_refills_in_both_directions() -> anyhow::Result<()> {
        let data = counting(4096);
        let mut stream = BufferedStream::with_cache_size(io::Cursor::new(&data[..]), 64)?;

        for offset in (0..4000u64).step_by(37) {
            assert_eq!(stream.peek(10, offset)?, &data[offset as usize..offset as usize + 10]);
        }

        for offset in (0..4000u64).rev().step_by(41) {
            let mut cursor = offset;
            let bytes = stream.read_bytes(10, &mut cursor, false, true)?;
            assert_eq!(bytes, &data[offset as usize..offset as usize + 10]);
        }

        let window: [u8; 3] = peek_array(&mut stream, 4093, true)?;
        assert_eq!(window, [data[4093], data[4094], data[4095]]);
        Ok(())
    }
}
