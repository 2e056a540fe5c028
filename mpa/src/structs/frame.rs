use std::fmt::{self, Display};
use std::ops::Range;

use log::{Level, debug};

use crate::log_or_err;
use crate::process::Options;
use crate::process::resync::{SyncMode, resync};
use crate::structs::header::{HEADER_SIZE, Layer, MpaHeader, SUBBANDS};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::crc::MPEG_AUDIO_CRC;
use crate::utils::errors::Result;
use crate::utils::stream::ByteStream;

/// Size of the CRC word following a protected header.
pub const CRC_SIZE: usize = 2;

/// One located frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpaFrame {
    pub header: MpaHeader,
    /// Offset of the header in the stream.
    pub offset: u64,
    /// Frame size in bytes, header included.
    pub size: u32,
    /// Set when the stream ends right after this frame.
    pub is_last: bool,
}

impl MpaFrame {
    /// Resyncs from `offset` and, when asked to, checks that a compatible
    /// frame follows.
    ///
    /// The follow-up probe is advisory: a missing successor is reported at
    /// [`Level::Warn`] and only fails when `options.fail_level` includes it.
    /// Running into the end of `bounds` marks the frame as the last one.
    pub fn find<S>(
        stream: &mut S,
        offset: u64,
        mode: SyncMode,
        compare: Option<&MpaHeader>,
        bounds: Range<u64>,
        options: &Options,
    ) -> Result<Self>
    where
        S: ByteStream + ?Sized,
    {
        let (offset, header) = resync(stream, offset, mode, compare, bounds.clone())?;

        let mut frame = Self {
            header,
            offset,
            size: header.frame_size(),
            is_last: false,
        };

        if options.check_subsequent {
            let reference = compare.copied().unwrap_or(header);
            frame.probe_subsequent(stream, &reference, bounds, options)?;
        }

        Ok(frame)
    }

    fn probe_subsequent<S>(
        &mut self,
        stream: &mut S,
        reference: &MpaHeader,
        bounds: Range<u64>,
        options: &Options,
    ) -> Result<()>
    where
        S: ByteStream + ?Sized,
    {
        match resync(stream, self.end(), SyncMode::Exact, Some(reference), bounds) {
            Ok((offset, _)) if offset != self.end() => {
                debug!(
                    "Frame at {} is followed by a frame at {offset} instead of {}",
                    self.offset,
                    self.end()
                );
            }
            Ok(_) => {}
            Err(e) if e.is_end_of_stream() => self.is_last = true,
            Err(e) => log_or_err!(options, Level::Warn, e),
        }

        Ok(())
    }

    /// Offset of the byte after this frame.
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.size)
    }

    /// Number of bits covered by the CRC after the CRC word, `None` when
    /// the layer is not checked.
    fn protected_bits(&self) -> Option<u64> {
        let header = &self.header;
        match header.layer {
            Layer::Layer1 if header.is_mono() => Some(128),
            Layer::Layer1 => {
                let bound = u64::from(header.bound);
                Some(4 * (2 * bound + (u64::from(SUBBANDS) - bound)))
            }
            // Needs the decoded bit allocation, which is not parsed.
            Layer::Layer2 => None,
            Layer::Layer3 => Some(u64::from(header.side_info_size()) * 8),
        }
    }

    /// Verifies the CRC-16 of a protected frame.
    ///
    /// The checksum runs over the last 16 header bits and the protected bits
    /// after the CRC word. Frames without CRC, and Layer II frames, report
    /// success.
    pub fn check_crc<S>(&self, stream: &mut S) -> Result<bool>
    where
        S: ByteStream + ?Sized,
    {
        if !self.header.crc_present {
            return Ok(true);
        }

        let Some(protected_bits) = self.protected_bits() else {
            return Ok(true);
        };

        let len = HEADER_SIZE + CRC_SIZE + protected_bits.div_ceil(8) as usize;
        let bytes = stream.peek(len, self.offset)?;
        let stored = u16::from_be_bytes([bytes[HEADER_SIZE], bytes[HEADER_SIZE + 1]]);

        let mut reader = BsIoSliceReader::from_slice(bytes);
        let checksum = reader.crc16_update(&MPEG_AUDIO_CRC, MPEG_AUDIO_CRC.init, 16, 16)?;
        let checksum = reader.crc16_update(
            &MPEG_AUDIO_CRC,
            checksum,
            ((HEADER_SIZE + CRC_SIZE) * 8) as u64,
            protected_bits,
        )?;

        Ok(checksum == stored)
    }
}

impl Display for MpaFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes at {}: {}", self.size, self.offset, self.header)
    }
}
