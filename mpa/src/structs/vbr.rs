//! VBR headers stored in the first frame of a stream.
//!
//! A XING (or `Info` for CBR) header follows the Layer III side information
//! and may carry a [`LameTag`]. A VBRI header, written by the Fraunhofer
//! encoder, sits at a fixed 32 bytes after the frame header.

use std::fmt::{self, Display};

use byteorder::{BigEndian, ReadBytesExt};
use log::debug;

use crate::structs::frame::MpaFrame;
use crate::structs::header::HEADER_SIZE;
use crate::structs::lame::LameTag;
use crate::utils::errors::Result;
use crate::utils::stream::ByteStream;

pub const XING_FRAMES_FLAG: u32 = 0x1;
pub const XING_BYTES_FLAG: u32 = 0x2;
pub const XING_TOC_FLAG: u32 = 0x4;
pub const XING_QUALITY_FLAG: u32 = 0x8;

pub const XING_TOC_SIZE: usize = 100;

/// Distance from the XING signature to a nested LAME tag.
pub const LAME_TAG_OFFSET: u64 = 120;

/// Distance from the frame start to the VBRI signature.
pub const VBRI_OFFSET: u64 = HEADER_SIZE as u64 + 32;

const VBRI_HEADER_SIZE: usize = 26;

#[derive(Debug, Clone, PartialEq)]
pub enum VbrHeader {
    Xing(XingHeader),
    Vbri(VbriHeader),
}

type Detector = fn(&mut dyn ByteStream, &MpaFrame) -> Result<Option<VbrHeader>>;

/// Probed in order, the first hit wins.
const DETECTORS: [Detector; 2] = [XingHeader::detect, VbriHeader::detect];

impl VbrHeader {
    /// Looks for a VBR header inside `frame`.
    pub fn find(stream: &mut dyn ByteStream, frame: &MpaFrame) -> Result<Option<Self>> {
        for detect in DETECTORS {
            match detect(stream, frame) {
                Ok(Some(header)) => return Ok(Some(header)),
                Ok(None) => {}
                Err(e) if e.is_end_of_stream() => debug!("VBR probe ran off the stream: {e}"),
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    /// Number of frames, 0 when not stored.
    pub fn frames(&self) -> u32 {
        match self {
            Self::Xing(xing) => xing.frames.unwrap_or(0),
            Self::Vbri(vbri) => vbri.frames,
        }
    }

    /// Number of audio bytes, 0 when not stored.
    pub fn bytes(&self) -> u32 {
        match self {
            Self::Xing(xing) => xing.bytes.unwrap_or(0),
            Self::Vbri(vbri) => vbri.bytes,
        }
    }

    /// Byte offset from the first frame for a playback position in percent.
    pub fn seek_position(&self, percent: f32) -> u64 {
        match self {
            Self::Xing(xing) => xing.seek_position(percent),
            Self::Vbri(vbri) => vbri.seek_position(percent),
        }
    }

    pub fn lame(&self) -> Option<&LameTag> {
        match self {
            Self::Xing(xing) => xing.lame.as_ref(),
            Self::Vbri(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Xing(xing) if xing.is_info => "Info",
            Self::Xing(_) => "XING",
            Self::Vbri(_) => "VBRI",
        }
    }
}

impl Display for VbrHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} frames, {} bytes",
            self.name(),
            self.frames(),
            self.bytes()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XingHeader {
    /// Offset of the signature.
    pub offset: u64,
    /// Signature is `Info` rather than `Xing`.
    pub is_info: bool,
    pub frames: Option<u32>,
    pub bytes: Option<u32>,
    pub toc: Option<[u8; XING_TOC_SIZE]>,
    /// 0 (best) to 100 (worst).
    pub quality: Option<u32>,
    pub lame: Option<LameTag>,
}

impl XingHeader {
    fn detect(stream: &mut dyn ByteStream, frame: &MpaFrame) -> Result<Option<VbrHeader>> {
        let offset =
            frame.offset + HEADER_SIZE as u64 + u64::from(frame.header.side_info_size());

        let mut head = stream.peek(8, offset)?;
        let is_info = match &head[..4] {
            b"Xing" => false,
            b"Info" => true,
            _ => return Ok(None),
        };
        head = &head[4..];
        let flags = head.read_u32::<BigEndian>()?;

        let len = 8
            + 4 * usize::from(flags & XING_FRAMES_FLAG != 0)
            + 4 * usize::from(flags & XING_BYTES_FLAG != 0)
            + XING_TOC_SIZE * usize::from(flags & XING_TOC_FLAG != 0)
            + 4 * usize::from(flags & XING_QUALITY_FLAG != 0);
        let mut reader = &stream.peek(len, offset)?[8..];

        let frames = if flags & XING_FRAMES_FLAG != 0 {
            Some(reader.read_u32::<BigEndian>()?)
        } else {
            None
        };
        let bytes = if flags & XING_BYTES_FLAG != 0 {
            Some(reader.read_u32::<BigEndian>()?)
        } else {
            None
        };
        let toc = if flags & XING_TOC_FLAG != 0 {
            let mut toc = [0u8; XING_TOC_SIZE];
            std::io::Read::read_exact(&mut reader, &mut toc)?;
            Some(toc)
        } else {
            None
        };
        let quality = if flags & XING_QUALITY_FLAG != 0 {
            Some(reader.read_u32::<BigEndian>()?)
        } else {
            None
        };

        let lame = LameTag::find(stream, offset + LAME_TAG_OFFSET)?;

        Ok(Some(VbrHeader::Xing(Self {
            offset,
            is_info,
            frames,
            bytes,
            toc,
            quality,
            lame,
        })))
    }

    /// Interpolates the table of contents, each entry being the position in
    /// 1/256 of the stream at one percent of the playback time.
    pub fn seek_position(&self, percent: f32) -> u64 {
        let bytes = f64::from(self.bytes.unwrap_or(0));
        let percent = f64::from(percent.clamp(0.0, 100.0));

        let Some(toc) = &self.toc else {
            return (percent / 100.0 * bytes) as u64;
        };

        let index = (percent as usize).min(XING_TOC_SIZE - 1);
        let low = f64::from(toc[index]);
        let high = toc.get(index + 1).map_or(256.0, |&v| f64::from(v));
        let position = low + (high - low) * (percent - index as f64);

        (position / 256.0 * bytes) as u64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VbriHeader {
    /// Offset of the signature.
    pub offset: u64,
    pub version: u16,
    pub delay: f32,
    pub quality: u16,
    pub bytes: u32,
    pub frames: u32,
    pub scale: u16,
    /// Size of one table entry in bytes.
    pub entry_size: u16,
    pub frames_per_entry: u16,
    /// Unscaled byte counts, one per `frames_per_entry` frames.
    pub toc: Vec<u32>,
}

impl VbriHeader {
    fn detect(stream: &mut dyn ByteStream, frame: &MpaFrame) -> Result<Option<VbrHeader>> {
        let offset = frame.offset + VBRI_OFFSET;

        let head = stream.peek(VBRI_HEADER_SIZE, offset)?;
        if !head.starts_with(b"VBRI") {
            return Ok(None);
        }

        let mut reader = &head[4..];
        let version = reader.read_u16::<BigEndian>()?;
        let delay = f32::from(reader.read_u16::<BigEndian>()?);
        let quality = reader.read_u16::<BigEndian>()?;
        let bytes = reader.read_u32::<BigEndian>()?;
        let frames = reader.read_u32::<BigEndian>()?;
        let entries = reader.read_u16::<BigEndian>()?;
        let scale = reader.read_u16::<BigEndian>()?;
        let entry_size = reader.read_u16::<BigEndian>()?;
        let frames_per_entry = reader.read_u16::<BigEndian>()?;

        if !(1..=4).contains(&entry_size) {
            debug!("VBRI header at {offset} has an invalid entry size {entry_size}");
            return Ok(None);
        }

        let table_len = usize::from(entries) * usize::from(entry_size);
        let mut table = stream.peek(table_len, offset + VBRI_HEADER_SIZE as u64)?;
        let toc = (0..entries)
            .map(|_| table.read_uint::<BigEndian>(usize::from(entry_size)).map(|v| v as u32))
            .collect::<std::io::Result<Vec<_>>>()?;

        Ok(Some(VbrHeader::Vbri(Self {
            offset,
            version,
            delay,
            quality,
            bytes,
            frames,
            scale,
            entry_size,
            frames_per_entry,
            toc,
        })))
    }

    /// Sums the table up to the entry covering the requested frame and
    /// interpolates inside it.
    pub fn seek_position(&self, percent: f32) -> u64 {
        let percent = f64::from(percent.clamp(0.0, 100.0));

        if self.toc.is_empty() || self.frames == 0 || self.frames_per_entry == 0 {
            return (percent / 100.0 * f64::from(self.bytes)) as u64;
        }

        let target = percent / 100.0 * f64::from(self.frames) / f64::from(self.frames_per_entry);
        let scale = f64::from(self.scale.max(1));

        let mut position = 0.0;
        for (index, &entry) in self.toc.iter().enumerate() {
            let span = f64::from(entry) * scale;
            let covered = target - index as f64;
            if covered < 1.0 {
                position += span * covered.max(0.0);
                break;
            }
            position += span;
        }

        position as u64
    }
}
