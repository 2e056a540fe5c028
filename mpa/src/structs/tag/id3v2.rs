//! ID3v2 header (`ID3`) and footer (`3DI`).
//!
//! Both are 10 bytes: signature, major version, revision, flags and a
//! synchsafe size that excludes the header and the footer.

use crate::structs::tag::{Tag, TagKind, TagVersion, absorb_end_of_stream, tail};
use crate::utils::errors::Result;
use crate::utils::stream::{ByteStream, peek_array};

pub const ID3V2_HEADER_SIZE: u64 = 10;

const UNSYNCHRONISATION: u8 = 0x80;
const EXTENDED_HEADER: u8 = 0x40;
const EXPERIMENTAL: u8 = 0x20;
const FOOTER_PRESENT: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3v2Flags {
    pub unsynchronisation: bool,
    pub extended_header: bool,
    pub experimental: bool,
    pub footer: bool,
}

impl From<u8> for Id3v2Flags {
    fn from(flags: u8) -> Self {
        Self {
            unsynchronisation: flags & UNSYNCHRONISATION != 0,
            extended_header: flags & EXTENDED_HEADER != 0,
            experimental: flags & EXPERIMENTAL != 0,
            footer: flags & FOOTER_PRESENT != 0,
        }
    }
}

/// Decodes a 28-bit synchsafe integer, `None` if any byte has its top bit set.
pub fn decode_synchsafe(bytes: [u8; 4]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, &b| {
        if b & 0x80 != 0 {
            None
        } else {
            Some((acc << 7) | u32::from(b))
        }
    })
}

/// Encodes the low 28 bits of `value`.
pub fn encode_synchsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

/// `ID3` at `begin` when prepended, `3DI` in the last 10 bytes when appended.
pub fn find(
    stream: &mut dyn ByteStream,
    appended: bool,
    begin: u64,
    end: u64,
) -> Result<Option<Tag>> {
    absorb_end_of_stream(read(stream, appended, begin, end))
}

fn read(stream: &mut dyn ByteStream, appended: bool, begin: u64, end: u64) -> Result<Option<Tag>> {
    let (offset, signature) = if appended {
        let Some(offset) = tail(begin, end, ID3V2_HEADER_SIZE) else {
            return Ok(None);
        };
        (offset, b"3DI")
    } else {
        (begin, b"ID3")
    };

    let header: [u8; 10] = peek_array(stream, offset, appended)?;
    if &header[..3] != signature {
        return Ok(None);
    }

    let Some(body) = decode_synchsafe([header[6], header[7], header[8], header[9]]) else {
        return Ok(None);
    };

    let flags = Id3v2Flags::from(header[5]);
    let version = TagVersion::with_revision(2, header[3], header[4]);

    let mut size = u64::from(body) + ID3V2_HEADER_SIZE;
    // The footer copies the header, so an appended tag always has both.
    if appended || flags.footer {
        size += ID3V2_HEADER_SIZE;
    }

    let kind = TagKind::Id3v2(flags);
    Ok(if appended {
        Tag::ending_at(kind, version, size, begin, end)
    } else {
        Tag::starting_at(kind, version, size, begin, end)
    })
}
