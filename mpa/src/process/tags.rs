use std::ops::Range;

use log::{Level, debug};

use crate::log_or_err;
use crate::process::Options;
use crate::structs::tag::{Detector, Tag, ape, id3v1, id3v2, lyrics3, musicmatch};
use crate::utils::errors::{MpaError, Result};
use crate::utils::stream::ByteStream;

/// Detectors for the end of the stream, in priority order.
const APPENDED: [Detector; 5] = [
    id3v1::find,
    musicmatch::find,
    id3v2::find,
    lyrics3::find,
    ape::find,
];

/// Detectors for the start of the stream, in priority order.
const PREPENDED: [Detector; 2] = [id3v2::find, ape::find];

/// Tags around the audio and the range left between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagChain {
    tags: Vec<Tag>,
    begin: u64,
    end: u64,
}

impl TagChain {
    /// Strips tags off both ends of the stream.
    ///
    /// After each hit the detectors run again from the first one against
    /// the narrowed range, until a full pass finds nothing. `begin` only
    /// moves forward and `end` only moves backward.
    pub fn scan(stream: &mut dyn ByteStream, options: &Options) -> Result<Self> {
        let mut chain = Self {
            tags: Vec::new(),
            begin: 0,
            end: stream.size(),
        };

        chain.strip(stream, true, &APPENDED, options)?;
        chain.strip(stream, false, &PREPENDED, options)?;

        Ok(chain)
    }

    fn strip(
        &mut self,
        stream: &mut dyn ByteStream,
        appended: bool,
        detectors: &[Detector],
        options: &Options,
    ) -> Result<()> {
        'pass: loop {
            for detect in detectors {
                let found = match detect(stream, appended, self.begin, self.end) {
                    Ok(found) => found,
                    Err(e @ MpaError::CorruptLyricsTag(_)) => {
                        log_or_err!(options, Level::Warn, e);
                        None
                    }
                    Err(e) => return Err(e),
                };

                let Some(tag) = found else {
                    continue;
                };

                debug!("Found {tag}");
                if appended {
                    self.end = tag.offset;
                } else {
                    self.begin = tag.end();
                }
                self.tags.push(tag);
                continue 'pass;
            }

            return Ok(());
        }
    }

    /// Tags in the order they were found.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Offset of the first byte after the prepended tags.
    pub fn begin(&self) -> u64 {
        self.begin
    }

    /// Offset of the first byte of the appended tags.
    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn range(&self) -> Range<u64> {
        self.begin..self.end
    }
}
