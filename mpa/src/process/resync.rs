use std::ops::Range;

use log::trace;

use crate::structs::header::{HEADER_SIZE, MpaHeader, is_sync_candidate};
use crate::utils::errors::{HeaderError, MpaError, Result};
use crate::utils::stream::{ByteStream, peek_array};

/// Bytes probed on either side of the expected offset in [`SyncMode::Exact`].
pub const TOLERANCE: u64 = 6;

/// Bytes scanned by the inexact modes before giving up.
pub const MAX_RANGE: u64 = 16384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Expected offset first, then `+1, -1, +2, -2, ...` up to [`TOLERANCE`].
    /// Any rejected candidate is an error.
    Exact,
    /// Byte-by-byte toward the end, skipping rejected candidates.
    Forward,
    /// Byte-by-byte toward the beginning, skipping rejected candidates.
    Backward,
}

/// Locates a frame header near `offset` inside `bounds`.
///
/// When `compare` is given, a candidate must also be compatible with it.
/// Returns the offset of the header together with the decoded header.
pub fn resync<S>(
    stream: &mut S,
    offset: u64,
    mode: SyncMode,
    compare: Option<&MpaHeader>,
    bounds: Range<u64>,
) -> Result<(u64, MpaHeader)>
where
    S: ByteStream + ?Sized,
{
    match mode {
        SyncMode::Exact => exact(stream, offset, compare, &bounds),
        SyncMode::Forward | SyncMode::Backward => {
            scan(stream, offset, mode == SyncMode::Backward, compare, &bounds)
        }
    }
}

fn exact<S>(
    stream: &mut S,
    offset: u64,
    compare: Option<&MpaHeader>,
    bounds: &Range<u64>,
) -> Result<(u64, MpaHeader)>
where
    S: ByteStream + ?Sized,
{
    let window = read_window(stream, offset, bounds, false)?;
    if let Some(header) = probe(window, offset, compare)? {
        return Ok((offset, header));
    }

    for step in 1..=TOLERANCE {
        let candidates = [offset.checked_add(step), offset.checked_sub(step)];
        for candidate in candidates.into_iter().flatten() {
            let window = match read_window(stream, candidate, bounds, false) {
                Ok(window) => window,
                Err(e) if e.is_end_of_stream() => continue,
                Err(e) => return Err(e),
            };

            if let Some(header) = probe(window, candidate, compare)? {
                trace!("Exact resync moved from {offset} to {candidate}");
                return Ok((candidate, header));
            }
        }
    }

    Err(MpaError::NoFrameInTolerance(offset))
}

fn scan<S>(
    stream: &mut S,
    offset: u64,
    reverse: bool,
    compare: Option<&MpaHeader>,
    bounds: &Range<u64>,
) -> Result<(u64, MpaHeader)>
where
    S: ByteStream + ?Sized,
{
    let mut position = offset;

    for _ in 0..MAX_RANGE {
        let window = read_window(stream, position, bounds, reverse)?;

        match probe(window, position, compare) {
            Ok(Some(header)) => return Ok((position, header)),
            Ok(None) => {}
            Err(e) if e.is_recoverable() => trace!("Skipping candidate: {e}"),
            Err(e) => return Err(e),
        }

        position = if reverse {
            position.checked_sub(1).ok_or(MpaError::EndOfStream {
                offset: 0,
                size: HEADER_SIZE,
                len: bounds.end,
            })?
        } else {
            position + 1
        };
    }

    Err(MpaError::NoFrameInRange {
        offset,
        range: MAX_RANGE,
    })
}

fn read_window<S>(
    stream: &mut S,
    offset: u64,
    bounds: &Range<u64>,
    reverse: bool,
) -> Result<[u8; HEADER_SIZE]>
where
    S: ByteStream + ?Sized,
{
    if offset < bounds.start
        || offset
            .checked_add(HEADER_SIZE as u64)
            .is_none_or(|end| end > bounds.end)
    {
        return Err(MpaError::EndOfStream {
            offset,
            size: HEADER_SIZE,
            len: bounds.end,
        });
    }

    peek_array(stream, offset, reverse)
}

/// `Ok(None)` when the window fails the sync pre-filter.
fn probe(
    window: [u8; HEADER_SIZE],
    offset: u64,
    compare: Option<&MpaHeader>,
) -> Result<Option<MpaHeader>> {
    if !is_sync_candidate(&window) {
        return Ok(None);
    }

    let header =
        MpaHeader::decode(window).map_err(|source| MpaError::Header { offset, source })?;

    if compare.is_some_and(|reference| !reference.is_compatible(&header)) {
        return Err(MpaError::Header {
            offset,
            source: HeaderError::Incompatible,
        });
    }

    Ok(Some(header))
}
