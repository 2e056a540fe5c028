//! MusicMatch tag.
//!
//! Only the footer has a fixed position. From the end of the tag:
//!
//! - footer, 48 bytes: signature padded to 32 bytes, 4 byte version
//! - data offsets, 20 bytes: five little endian section offsets
//! - audio metadata, one of several fixed sizes depending on the writer
//! - version information, 256 bytes, starting with `18273645`
//! - unused (4), image data, image extension (4)
//! - optional header, 256 bytes, starting with `18273645`
//!
//! The metadata size is not stored. It is guessed by looking for the
//! version information block behind each candidate size.

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use crate::structs::lame::ascii_field;
use crate::structs::tag::{Tag, TagKind, TagVersion, absorb_end_of_stream, tail};
use crate::utils::errors::Result;
use crate::utils::stream::{ByteStream, peek_array};

pub const FOOTER_SIZE: u64 = 48;
pub const SIGNATURE: &[u8; 32] = b"Brava Software Inc.             ";

const OFFSETS_SIZE: u64 = 20;
const VERSION_INFO_SIZE: u64 = 256;
const HEADER_SIZE: u64 = 256;
const SYNC: &[u8; 8] = b"18273645";

/// Candidate audio metadata section sizes, tried in order.
pub const METADATA_SIZES: [u64; 3] = [7936, 8004, 8132];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicMatchInfo {
    /// Version text from the footer, e.g. `3.05`.
    pub version: String,
    pub metadata_size: u64,
    pub has_header: bool,
}

/// Signature 48 bytes before the end of the window. Appended only.
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

    let bytes: [u8; FOOTER_SIZE as usize] = peek_array(stream, footer, true)?;
    if !bytes.starts_with(SIGNATURE) {
        return Ok(None);
    }
    let version_text = ascii_field(&bytes[SIGNATURE.len()..SIGNATURE.len() + 4]);

    let Some(offsets_at) = tail(begin, footer, OFFSETS_SIZE) else {
        return Ok(None);
    };

    let mut version_info = None;
    for metadata_size in METADATA_SIZES {
        let Some(at) = offsets_at.checked_sub(metadata_size + VERSION_INFO_SIZE) else {
            continue;
        };
        if at >= begin && has_sync(stream, at)? {
            version_info = Some((at, metadata_size));
            break;
        }
    }

    let Some((version_info, metadata_size)) = version_info else {
        debug!("MusicMatch footer at {footer} without version information");
        return Ok(None);
    };

    let offsets: [u8; OFFSETS_SIZE as usize] = peek_array(stream, offsets_at, true)?;
    let mut reader = &offsets[..];
    let image_extension = reader.read_u32::<LittleEndian>()?;
    let _image_binary = reader.read_u32::<LittleEndian>()?;
    let _unused = reader.read_u32::<LittleEndian>()?;
    let version_info_offset = reader.read_u32::<LittleEndian>()?;

    let Some(image_sections) = version_info_offset.checked_sub(image_extension) else {
        debug!("MusicMatch data offsets at {offsets_at} are out of order");
        return Ok(None);
    };
    let Some(mut offset) = version_info
        .checked_sub(u64::from(image_sections))
        .filter(|&offset| offset >= begin)
    else {
        return Ok(None);
    };

    let has_header = offset >= begin + HEADER_SIZE && has_sync(stream, offset - HEADER_SIZE)?;
    if has_header {
        offset -= HEADER_SIZE;
    }

    let version = parse_version(&version_text);
    Ok(Tag::ending_at(
        TagKind::MusicMatch(MusicMatchInfo {
            version: version_text,
            metadata_size,
            has_header,
        }),
        version,
        end - offset,
        begin,
        end,
    ))
}

fn has_sync(stream: &mut dyn ByteStream, offset: u64) -> Result<bool> {
    Ok(stream.peek(SYNC.len(), offset)? == SYNC)
}

/// `3.05` becomes 3.0.5.
fn parse_version(text: &str) -> TagVersion {
    let digits: Vec<u8> = text
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();

    match digits[..] {
        [major, minor, revision, ..] => TagVersion::with_revision(major, minor, revision),
        [major, minor] => TagVersion::new(major, minor),
        [major] => TagVersion::new(major, 0),
        [] => TagVersion::new(0, 0),
    }
}
