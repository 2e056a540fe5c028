//! APE tag footer and header.
//!
//! Both are 32 bytes, little endian:
//!
//! | Offset | Size | Field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 8    | `APETAGEX`                              |
//! | 8      | 4    | Version, 1000 or 2000                   |
//! | 12     | 4    | Size of the items and the footer        |
//! | 16     | 4    | Item count                              |
//! | 20     | 4    | Flags, bit 31 set when a header exists  |
//! | 24     | 8    | Reserved                                |

use byteorder::{LittleEndian, ReadBytesExt};

use crate::structs::tag::{Tag, TagKind, TagVersion, absorb_end_of_stream, tail};
use crate::utils::errors::Result;
use crate::utils::stream::{ByteStream, peek_array};

pub const APE_FOOTER_SIZE: u64 = 32;

const APE_MAGIC: &[u8; 8] = b"APETAGEX";
const HAS_HEADER: u32 = 1 << 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApeInfo {
    pub items: u32,
    pub has_header: bool,
}

/// `APETAGEX` at `begin` when prepended, in the last 32 bytes when appended.
pub fn find(
    stream: &mut dyn ByteStream,
    appended: bool,
    begin: u64,
    end: u64,
) -> Result<Option<Tag>> {
    absorb_end_of_stream(read(stream, appended, begin, end))
}

fn read(stream: &mut dyn ByteStream, appended: bool, begin: u64, end: u64) -> Result<Option<Tag>> {
    let offset = if appended {
        let Some(offset) = tail(begin, end, APE_FOOTER_SIZE) else {
            return Ok(None);
        };
        offset
    } else {
        begin
    };

    let block: [u8; APE_FOOTER_SIZE as usize] = peek_array(stream, offset, appended)?;
    if !block.starts_with(APE_MAGIC) {
        return Ok(None);
    }

    let mut reader = &block[APE_MAGIC.len()..];
    let version = match reader.read_u32::<LittleEndian>()? {
        1000 => TagVersion::new(1, 0),
        2000 => TagVersion::new(2, 0),
        _ => return Ok(None),
    };
    let tag_size = reader.read_u32::<LittleEndian>()?;
    let items = reader.read_u32::<LittleEndian>()?;
    let flags = reader.read_u32::<LittleEndian>()?;

    // A prepended block is the header itself. Version 1 tags never have one.
    let has_header = !appended || (version.major == 2 && flags & HAS_HEADER != 0);

    let mut size = u64::from(tag_size);
    if has_header {
        size += APE_FOOTER_SIZE;
    }

    let kind = TagKind::Ape(ApeInfo { items, has_header });
    Ok(if appended {
        Tag::ending_at(kind, version, size, begin, end)
    } else {
        Tag::starting_at(kind, version, size, begin, end)
    })
}
