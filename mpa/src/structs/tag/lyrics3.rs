//! Lyrics3 tags, stored between the audio and an ID3v1 tag.
//!
//! Version 2 ends with a six digit size and `LYRICS200`. Version 1 has no
//! size field: it ends with `LYRICSEND` and its start is found by searching
//! backward for `LYRICSBEGIN`.

use log::debug;

use crate::structs::tag::{Tag, TagKind, TagVersion, absorb_end_of_stream, tail};
use crate::utils::errors::{MpaError, Result};
use crate::utils::stream::{ByteStream, peek_array};

const FOOTER_SIZE: u64 = 9;
const V2_SIZE_DIGITS: u64 = 6;
const V1_BEGIN: &[u8] = b"LYRICSBEGIN";

/// Longest lyrics text a version 1 tag can hold.
pub const V1_MAX_LYRICS: u64 = 5100;

/// `LYRICS200` or `LYRICSEND` in the last 9 bytes of the window. Appended only.
///
/// A version 1 tag without its begin marker fails with
/// [`MpaError::CorruptLyricsTag`].
pub fn find(
    stream: &mut dyn ByteStream,
    appended: bool,
    begin: u64,
    end: u64,
) -> Result<Option<Tag>> {
    if !appended {
        return Ok(None);
    }

    absorb_end_of_stream(read(stream, begin, end))
}

fn read(stream: &mut dyn ByteStream, begin: u64, end: u64) -> Result<Option<Tag>> {
    let Some(footer) = tail(begin, end, FOOTER_SIZE) else {
        return Ok(None);
    };

    let signature: [u8; FOOTER_SIZE as usize] = peek_array(stream, footer, true)?;
    match &signature {
        b"LYRICS200" => read_v2(stream, begin, end, footer),
        b"LYRICSEND" => read_v1(stream, begin, end, footer),
        _ => Ok(None),
    }
}

fn read_v2(stream: &mut dyn ByteStream, begin: u64, end: u64, footer: u64) -> Result<Option<Tag>> {
    let Some(offset) = footer.checked_sub(V2_SIZE_DIGITS).filter(|&o| o >= begin) else {
        return Ok(None);
    };

    let digits = stream.peek(V2_SIZE_DIGITS as usize, offset)?;
    let Some(size) = std::str::from_utf8(digits)
        .ok()
        .filter(|text| text.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|text| text.parse::<u64>().ok())
    else {
        debug!("Lyrics3 v2 footer at {footer} has no size");
        return Ok(None);
    };

    Ok(Tag::ending_at(
        TagKind::Lyrics3,
        TagVersion::new(2, 0),
        size + V2_SIZE_DIGITS + FOOTER_SIZE,
        begin,
        end,
    ))
}

fn read_v1(stream: &mut dyn ByteStream, begin: u64, end: u64, footer: u64) -> Result<Option<Tag>> {
    let span = V1_MAX_LYRICS + V1_BEGIN.len() as u64;
    let mut start = footer.saturating_sub(span).max(begin);

    let window = stream.read_bytes((footer - start) as usize, &mut start, false, true)?;
    let Some(position) = window
        .windows(V1_BEGIN.len())
        .rposition(|candidate| candidate == V1_BEGIN)
    else {
        return Err(MpaError::CorruptLyricsTag(footer));
    };

    let offset = start + position as u64;
    Ok(Tag::ending_at(
        TagKind::Lyrics3,
        TagVersion::new(1, 0),
        end - offset,
        begin,
        end,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::stream::SliceStream;

    #[test]
    fn version_2_size_field() -> anyhow::Result<()> {
        let mut data = vec![0u8; 50];
        data.extend(b"LYRICSBEGININD00002110");
        data.extend(b"000022LYRICS200");
        let mut stream = SliceStream::from_slice(&data);

        let tag = find(&mut stream, true, 0, data.len() as u64)?.expect("Lyrics3");
        assert_eq!(tag.offset, 50);
        assert_eq!(tag.size, 37);
        assert_eq!(tag.version, TagVersion::new(2, 0));
        Ok(())
    }

    #[test]
    fn version_1_begin_marker() -> anyhow::Result<()> {
        let mut data = vec![0u8; 50];
        data.extend(b"LYRICSBEGIN");
        data.extend(vec![b'x'; 300]);
        data.extend(b"LYRICSEND");
        let mut stream = SliceStream::from_slice(&data);

        let tag = find(&mut stream, true, 0, data.len() as u64)?.expect("Lyrics3");
        assert_eq!(tag.offset, 50);
        assert_eq!(tag.size, 11 + 300 + 9);
        assert_eq!(tag.version, TagVersion::new(1, 0));
        Ok(())
    }

    #[test]
    fn version_1_without_begin_marker_is_corrupt() {
        let mut data = b"LYRICSBEGIN".to_vec();
        data.extend(vec![b'x'; V1_MAX_LYRICS as usize + 1]);
        data.extend(b"LYRICSEND");
        let mut stream = SliceStream::from_slice(&data);

        let err = find(&mut stream, true, 0, data.len() as u64).unwrap_err();
        assert!(matches!(err, MpaError::CorruptLyricsTag(offset) if offset == data.len() as u64 - 9));
    }

    #[test]
    fn version_2_with_garbage_size_is_ignored() -> anyhow::Result<()> {
        let data = b"0x0022LYRICS200".to_vec();
        let mut stream = SliceStream::from_slice(&data);

        assert_eq!(find(&mut stream, true, 0, data.len() as u64)?, None);
        assert_eq!(find(&mut stream, false, 0, data.len() as u64)?, None);
        Ok(())
    }
}
