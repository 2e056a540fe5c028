//! Metadata tags found before or after the audio frames.
//!
//! Every format has a detector with the same signature. A detector looks at
//! the current `[begin, end)` window of the stream, checks a signature at a
//! fixed position and returns the extent of the tag. It never reads outside
//! the window, so stacked tags are found one after another.

use std::fmt::{self, Display};

use log::debug;

use crate::utils::errors::Result;
use crate::utils::stream::ByteStream;

pub mod ape;
pub mod id3v1;
pub mod id3v2;
pub mod lyrics3;
pub mod musicmatch;

/// `(stream, appended, begin, end)`
pub type Detector = fn(&mut dyn ByteStream, bool, u64, u64) -> Result<Option<Tag>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TagVersion {
    pub major: u8,
    pub minor: u8,
    pub revision: Option<u8>,
}

impl TagVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self {
            major,
            minor,
            revision: None,
        }
    }

    pub const fn with_revision(major: u8, minor: u8, revision: u8) -> Self {
        Self {
            major,
            minor,
            revision: Some(revision),
        }
    }
}

impl Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(revision) = self.revision {
            write!(f, ".{revision}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    Id3v1(id3v1::Id3v1),
    Id3v2(id3v2::Id3v2Flags),
    Ape(ape::ApeInfo),
    Lyrics3,
    MusicMatch(musicmatch::MusicMatchInfo),
}

impl TagKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Id3v1(_) => "ID3v1",
            Self::Id3v2(_) => "ID3v2",
            Self::Ape(_) => "APE",
            Self::Lyrics3 => "Lyrics3",
            Self::MusicMatch(_) => "MusicMatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub version: TagVersion,
    pub offset: u64,
    pub size: u64,
    /// Stored after the audio rather than before it.
    pub appended: bool,
}

impl Tag {
    /// A tag of `size` bytes ending at `end`, `None` if it would start
    /// before `begin`.
    pub fn ending_at(
        kind: TagKind,
        version: TagVersion,
        size: u64,
        begin: u64,
        end: u64,
    ) -> Option<Self> {
        let offset = end.checked_sub(size).filter(|&offset| offset >= begin);
        if offset.is_none() {
            debug!("{} tag of {size} bytes does not fit before {end}", kind.name());
        }

        offset.map(|offset| Self {
            kind,
            version,
            offset,
            size,
            appended: true,
        })
    }

    /// A tag of `size` bytes starting at `begin`, `None` if it would run
    /// past `end`.
    pub fn starting_at(
        kind: TagKind,
        version: TagVersion,
        size: u64,
        begin: u64,
        end: u64,
    ) -> Option<Self> {
        let fits = begin.checked_add(size).is_some_and(|tag_end| tag_end <= end);
        if !fits {
            debug!("{} tag of {size} bytes does not fit after {begin}", kind.name());
            return None;
        }

        Some(Self {
            kind,
            version,
            offset: begin,
            size,
            appended: false,
        })
    }

    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at {} ({} bytes, {})",
            self.name(),
            self.version,
            self.offset,
            self.size,
            if self.appended { "appended" } else { "prepended" }
        )
    }
}

/// Offset of a `len` byte window ending at `end`, if it lies inside the window.
pub(crate) fn tail(begin: u64, end: u64, len: u64) -> Option<u64> {
    end.checked_sub(len).filter(|&offset| offset >= begin)
}

/// Turns a read past the window into a miss.
pub(crate) fn absorb_end_of_stream(result: Result<Option<Tag>>) -> Result<Option<Tag>> {
    match result {
        Err(e) if e.is_end_of_stream() => {
            debug!("Tag probe ran off the stream: {e}");
            Ok(None)
        }
        result => result,
    }
}
