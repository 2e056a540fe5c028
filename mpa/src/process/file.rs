use std::ops::Range;
use std::path::Path;

use log::{debug, info};

use crate::process::Options;
use crate::process::resync::{MAX_RANGE, SyncMode};
use crate::process::tags::TagChain;
use crate::structs::frame::MpaFrame;
use crate::structs::header::MIN_FRAME_SIZE;
use crate::structs::tag::Tag;
use crate::structs::vbr::VbrHeader;
use crate::utils::errors::{MpaError, Result};
use crate::utils::stream::{ByteStream, FileStream};

/// Frames of at most this bitrate at the start of a stream are skipped when
/// estimating the bitrate.
const LOW_BITRATE: u32 = 48_000;

/// Longest run of low bitrate frames skipped.
const MAX_LOW_BITRATE_FRAMES: usize = 25;

/// Frame navigation requests for [`MpaFile::frame`].
#[derive(Debug, Clone, Copy)]
pub enum FrameRequest<'a> {
    First,
    Last,
    /// The frame after the given one, resyncing past damaged data.
    Next(&'a MpaFrame),
    /// The frame that ends where the given one starts.
    Prev(&'a MpaFrame),
    /// The first compatible frame at or after an offset.
    Resync(u64),
}

/// An MPEG audio file: its tags, first frame, VBR header and duration.
///
/// # Example
///
/// ```rust,no_run
/// use mpa::process::file::{FrameRequest, MpaFile};
///
/// let mut file = MpaFile::open("track.mp3")?;
/// println!("{:.1} s", file.length_seconds());
///
/// let mut frame = file.frame(FrameRequest::First)?;
/// while let Some(current) = frame {
///     println!("{current}");
///     frame = file.frame(FrameRequest::Next(&current))?;
/// }
/// # Ok::<(), mpa::utils::errors::MpaError>(())
/// ```
#[derive(Debug)]
pub struct MpaFile<S = FileStream> {
    stream: S,
    tags: TagChain,
    first: MpaFrame,
    vbr: Option<VbrHeader>,
    bytes_per_second: u32,
    options: Options,
}

impl MpaFile<FileStream> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, Options::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        Self::from_stream(FileStream::open(path)?, options)
    }
}

impl<S: ByteStream> MpaFile<S> {
    /// Scans tags, locates the first frame and its VBR header, and
    /// estimates the average bitrate.
    pub fn from_stream(mut stream: S, options: Options) -> Result<Self> {
        let tags = TagChain::scan(&mut stream, &options)?;
        for tag in tags.tags() {
            info!("{tag}");
        }

        let first = MpaFrame::find(
            &mut stream,
            tags.begin(),
            SyncMode::Forward,
            None,
            tags.range(),
            &options,
        )?;
        info!("First frame: {first}");

        let vbr = VbrHeader::find(&mut stream, &first)?;
        if let Some(vbr) = &vbr {
            info!("{vbr}");
        }

        let mut file = Self {
            stream,
            tags,
            first,
            vbr,
            bytes_per_second: 0,
            options,
        };
        file.bytes_per_second = file.estimate_bytes_per_second();

        Ok(file)
    }

    fn estimate_bytes_per_second(&mut self) -> u32 {
        if let Some(vbr) = self.vbr.as_ref().filter(|vbr| vbr.frames() != 0) {
            let header = &self.first.header;
            let bytes = match vbr.bytes() {
                0 => self.tags.end() - self.tags.begin(),
                bytes => u64::from(bytes),
            };
            let seconds = f64::from(vbr.frames()) * f64::from(header.samples_per_frame())
                / f64::from(header.sample_rate);
            let estimate = (bytes as f64 / seconds) as u32;
            if estimate != 0 {
                return estimate;
            }
        }

        let mut frame = self.first;
        for _ in 0..MAX_LOW_BITRATE_FRAMES {
            if frame.header.bitrate > LOW_BITRATE {
                break;
            }

            match self.next_frame(&frame) {
                Ok(next) => frame = next,
                Err(e) => {
                    debug!("Bitrate estimate falls back to the first frame: {e}");
                    frame = self.first;
                    break;
                }
            }
        }

        frame.header.bitrate / 8
    }

    /// Navigates relative to a frame. `Ok(None)` at either end of the audio.
    pub fn frame(&mut self, request: FrameRequest<'_>) -> Result<Option<MpaFrame>> {
        match request {
            FrameRequest::First => {
                at_end_none(self.find(self.tags.begin(), SyncMode::Forward, false))
            }
            FrameRequest::Last => self.last_frame(),
            FrameRequest::Next(current) => match self.next_frame(current) {
                Ok(frame) => Ok(Some(frame)),
                Err(e) if e.is_end_of_stream() => Ok(None),
                Err(e) if matches!(e, MpaError::NoFrameInTolerance(_)) || e.is_recoverable() => {
                    debug!("{e}, resyncing");
                    at_end_none(self.resync_frame(current.end()))
                }
                Err(e) => Err(e),
            },
            FrameRequest::Prev(current) => self.prev_frame(current),
            FrameRequest::Resync(offset) => at_end_none(self.resync_frame(offset)),
        }
    }

    /// The frame expected right after `current`, within a few bytes.
    ///
    /// Fails with [`MpaError::NoFrameInTolerance`] when the stream is damaged
    /// there; [`MpaFile::resync_frame`] recovers from that.
    pub fn next_frame(&mut self, current: &MpaFrame) -> Result<MpaFrame> {
        self.find(current.end(), SyncMode::Exact, true)
    }

    /// The first frame at or after `offset` compatible with the first frame.
    pub fn resync_frame(&mut self, offset: u64) -> Result<MpaFrame> {
        self.find(offset, SyncMode::Forward, true)
    }

    fn prev_frame(&mut self, current: &MpaFrame) -> Result<Option<MpaFrame>> {
        let mut offset = current.offset;

        while current.offset - offset < MAX_RANGE {
            let Some(start) = offset.checked_sub(1) else {
                return Ok(None);
            };

            let Some(candidate) = at_end_none(self.find(start, SyncMode::Backward, true))? else {
                return Ok(None);
            };
            if candidate.end() == current.offset {
                return Ok(Some(candidate));
            }
            offset = candidate.offset;
        }

        Err(MpaError::NoFrameInRange {
            offset: current.offset,
            range: MAX_RANGE,
        })
    }

    fn last_frame(&mut self) -> Result<Option<MpaFrame>> {
        let end = self.tags.end();
        let mut offset = end.saturating_sub(MIN_FRAME_SIZE).max(self.tags.begin());

        loop {
            let Some(candidate) = at_end_none(self.find(offset, SyncMode::Backward, true))? else {
                return Ok(None);
            };
            if candidate.end() <= end {
                return Ok(Some(candidate));
            }

            let Some(previous) = candidate.offset.checked_sub(1) else {
                return Ok(None);
            };
            offset = previous;
        }
    }

    fn find(&mut self, offset: u64, mode: SyncMode, compare: bool) -> Result<MpaFrame> {
        let reference = compare.then_some(self.first.header);
        MpaFrame::find(
            &mut self.stream,
            offset,
            mode,
            reference.as_ref(),
            self.tags.range(),
            &self.options,
        )
    }

    /// Verifies the CRC of a frame of this file.
    pub fn check_crc(&mut self, frame: &MpaFrame) -> Result<bool> {
        frame.check_crc(&mut self.stream)
    }

    /// Absolute offset for a playback position in percent, from the VBR
    /// table of contents.
    pub fn seek_position(&self, percent: f32) -> Option<u64> {
        self.vbr
            .as_ref()
            .map(|vbr| self.first.offset + vbr.seek_position(percent))
    }

    pub fn tags(&self) -> &[Tag] {
        self.tags.tags()
    }

    pub fn begin(&self) -> u64 {
        self.tags.begin()
    }

    pub fn end(&self) -> u64 {
        self.tags.end()
    }

    pub fn audio_range(&self) -> Range<u64> {
        self.tags.range()
    }

    pub fn first_frame(&self) -> &MpaFrame {
        &self.first
    }

    pub fn vbr_header(&self) -> Option<&VbrHeader> {
        self.vbr.as_ref()
    }

    pub fn bytes_per_second(&self) -> u32 {
        self.bytes_per_second
    }

    pub fn length_seconds(&self) -> f64 {
        (self.tags.end() - self.first.offset) as f64 / f64::from(self.bytes_per_second)
    }
}

fn at_end_none(result: Result<MpaFrame>) -> Result<Option<MpaFrame>> {
    match result {
        Ok(frame) => Ok(Some(frame)),
        Err(e) if e.is_end_of_stream() => Ok(None),
        Err(e) => Err(e),
    }
}
