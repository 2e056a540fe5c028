use crate::structs::tag::{Tag, TagKind, TagVersion, absorb_end_of_stream, tail};
use crate::utils::errors::Result;
use crate::utils::stream::ByteStream;

pub const ID3V1_SIZE: u64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3v1 {
    /// Track number, only stored by ID3v1.1.
    pub track: Option<u8>,
}

/// `TAG` in the last 128 bytes of the window. Appended only.
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
    let Some(offset) = tail(begin, end, ID3V1_SIZE) else {
        return Ok(None);
    };

    let bytes = stream.peek(ID3V1_SIZE as usize, offset)?;
    if !bytes.starts_with(b"TAG") {
        return Ok(None);
    }

    // v1.1 splits the last comment byte off as a track number, keeping a
    // zero byte in front of it.
    let (track, version) = if bytes[125] == 0 && bytes[126] != 0 {
        (Some(bytes[126]), TagVersion::new(1, 1))
    } else {
        (None, TagVersion::new(1, 0))
    };

    Ok(Tag::ending_at(
        TagKind::Id3v1(Id3v1 { track }),
        version,
        ID3V1_SIZE,
        begin,
        end,
    ))
}
