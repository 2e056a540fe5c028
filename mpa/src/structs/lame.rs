//! LAME encoder tag nested in a XING/Info header.
//!
//! Encoders before 3.90 only wrote a 20 byte version string. Later ones
//! write a 9 byte string followed by encoding details:
//!
//! | Offset | Size | Field                                |
//! |--------|------|--------------------------------------|
//! | 0      | 9    | Encoder, e.g. `LAME3.99r`            |
//! | 9      | 1    | Revision (high nibble), VBR method   |
//! | 10     | 1    | Lowpass frequency / 100              |
//! | 11     | 8    | Replay gain                          |
//! | 19     | 1    | Encoding flags, ATH type             |
//! | 20     | 1    | Bitrate (minimal, ABR or CBR)        |
//! | 21     | 3    | Encoder delay, padding (12 bits each)|
//! | 24     | 4    | Misc, MP3 gain, preset, surround     |
//! | 28     | 4    | Music length                         |
//! | 32     | 4    | Music CRC, tag CRC                   |

use std::fmt::{self, Display};

use byteorder::{BigEndian, ReadBytesExt};
use log::debug;

use crate::utils::errors::Result;
use crate::utils::stream::ByteStream;

pub const LAME_MAGIC: &[u8; 4] = b"LAME";

const SIMPLE_TAG_SIZE: usize = 20;
const ENCODER_SIZE: usize = 9;
const FULL_TAG_SIZE: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LameVersion {
    pub major: u8,
    pub minor: u16,
}

impl LameVersion {
    /// First version writing the full tag.
    pub const FULL_TAG: Self = Self {
        major: 3,
        minor: 90,
    };

    /// Reads `<major>.<minor>` after the magic, e.g. `3.99r` or `3.100`.
    fn parse(encoder: &[u8]) -> Option<Self> {
        fn number(bytes: &[u8]) -> Option<(&str, &[u8])> {
            let end = bytes
                .iter()
                .position(|b| !b.is_ascii_digit())
                .unwrap_or(bytes.len());
            let (digits, rest) = bytes.split_at(end);
            Some((std::str::from_utf8(digits).ok()?, rest))
        }

        let (major, rest) = number(encoder.get(LAME_MAGIC.len()..)?)?;
        // `3.90.` and `3.99r` both stop at the first non-digit
        let (minor, _) = number(rest.strip_prefix(b".")?)?;

        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }

    pub fn has_full_tag(&self) -> bool {
        *self >= Self::FULL_TAG
    }
}

impl Display for LameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbrMethod {
    Unknown,
    Cbr,
    Abr,
    Vbr1,
    Vbr2,
    Vbr3,
    Vbr4,
    Cbr2Pass,
    Abr2Pass,
    Reserved(u8),
}

impl From<u8> for VbrMethod {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Unknown,
            1 => Self::Cbr,
            2 => Self::Abr,
            3 => Self::Vbr1,
            4 => Self::Vbr2,
            5 => Self::Vbr3,
            6 => Self::Vbr4,
            8 => Self::Cbr2Pass,
            9 => Self::Abr2Pass,
            v => Self::Reserved(v),
        }
    }
}

impl Display for VbrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Cbr => write!(f, "CBR"),
            Self::Abr => write!(f, "ABR"),
            Self::Vbr1 => write!(f, "VBR (method 1)"),
            Self::Vbr2 => write!(f, "VBR (method 2)"),
            Self::Vbr3 => write!(f, "VBR (method 3)"),
            Self::Vbr4 => write!(f, "VBR (method 4)"),
            Self::Cbr2Pass => write!(f, "CBR (2 pass)"),
            Self::Abr2Pass => write!(f, "ABR (2 pass)"),
            Self::Reserved(v) => write!(f, "Reserved ({v})"),
        }
    }
}

/// Fields of the full tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LameInfo {
    pub revision: u8,
    pub vbr_method: VbrMethod,
    /// Hz, 0 when unknown.
    pub lowpass: u32,
    /// kbps.
    pub bitrate: u8,
    /// Samples.
    pub encoder_delay: u16,
    /// Samples.
    pub encoder_padding: u16,
    /// Bytes.
    pub music_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LameTag {
    pub offset: u64,
    pub encoder: String,
    pub version: LameVersion,
    /// `None` for the simple tag written before 3.90.
    pub info: Option<LameInfo>,
}

impl LameTag {
    /// Probes for a tag at `offset`.
    ///
    /// A missing magic, an unreadable version or a tag running past the
    /// stream all yield `Ok(None)`.
    pub fn find<S>(stream: &mut S, offset: u64) -> Result<Option<Self>>
    where
        S: ByteStream + ?Sized,
    {
        match Self::read(stream, offset) {
            Err(e) if e.is_end_of_stream() => {
                debug!("LAME tag at {offset} is truncated");
                Ok(None)
            }
            result => result,
        }
    }

    fn read<S>(stream: &mut S, offset: u64) -> Result<Option<Self>>
    where
        S: ByteStream + ?Sized,
    {
        let encoder = stream.peek(ENCODER_SIZE, offset)?;
        if !encoder.starts_with(LAME_MAGIC) {
            return Ok(None);
        }

        let Some(version) = LameVersion::parse(encoder) else {
            debug!("LAME tag at {offset} has no readable version");
            return Ok(None);
        };

        if !version.has_full_tag() {
            let bytes = stream.peek(SIMPLE_TAG_SIZE, offset)?;
            return Ok(Some(Self {
                offset,
                encoder: ascii_field(bytes),
                version,
                info: None,
            }));
        }

        let bytes = stream.peek(FULL_TAG_SIZE, offset)?;
        let encoder = ascii_field(&bytes[..ENCODER_SIZE]);

        let mut reader = &bytes[ENCODER_SIZE..];
        let revision_method = reader.read_u8()?;
        let lowpass = u32::from(reader.read_u8()?) * 100;
        let _replay_gain = reader.read_u64::<BigEndian>()?;
        let _encoding_flags = reader.read_u8()?;
        let bitrate = reader.read_u8()?;
        let delays = reader.read_u24::<BigEndian>()?;
        let _misc = reader.read_u32::<BigEndian>()?;
        let music_length = reader.read_u32::<BigEndian>()?;

        Ok(Some(Self {
            offset,
            encoder,
            version,
            info: Some(LameInfo {
                revision: revision_method >> 4,
                vbr_method: VbrMethod::from(revision_method & 0x0F),
                lowpass,
                bitrate,
                encoder_delay: (delays >> 12) as u16,
                encoder_padding: (delays & 0xFFF) as u16,
                music_length,
            }),
        }))
    }
}

/// Text up to the first NUL, trailing spaces removed.
pub(crate) fn ascii_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::stream::SliceStream;
    use crate::utils::testing::lame_tag as full_tag;

    #[test]
    fn reads_the_full_tag() -> anyhow::Result<()> {
        let mut data = vec![0u8; 10];
        data.extend(full_tag(b"LAME3.99r"));
        let mut stream = SliceStream::from_slice(&data);

        let tag = LameTag::find(&mut stream, 10)?.expect("LAME tag");
        assert_eq!(tag.encoder, "LAME3.99r");
        assert_eq!(tag.version, LameVersion { major: 3, minor: 99 });

        let info = tag.info.expect("full tag");
        assert_eq!(info.revision, 1);
        assert_eq!(info.vbr_method, VbrMethod::Vbr1);
        assert_eq!(info.lowpass, 19500);
        assert_eq!(info.bitrate, 128);
        assert_eq!(info.encoder_delay, 576);
        assert_eq!(info.encoder_padding, 1600);
        assert_eq!(info.music_length, 1_000_000);
        Ok(())
    }

    #[test]
    fn three_digit_minor_versions_are_newer() -> anyhow::Result<()> {
        let data = full_tag(b"LAME3.100");
        let mut stream = SliceStream::from_slice(&data);

        let tag = LameTag::find(&mut stream, 0)?.expect("LAME tag");
        assert_eq!(tag.version.to_string(), "3.100");
        assert!(tag.info.is_some());
        Ok(())
    }

    #[test]
    fn trailing_dot_after_minor_version() -> anyhow::Result<()> {
        let data = full_tag(b"LAME3.90.");
        let mut stream = SliceStream::from_slice(&data);

        let tag = LameTag::find(&mut stream, 0)?.expect("LAME tag");
        assert_eq!(tag.version, LameVersion::FULL_TAG);
        assert_eq!(tag.info.map(|info| info.encoder_delay), Some(576));
        Ok(())
    }

    #[test]
    fn old_encoders_write_the_simple_tag() -> anyhow::Result<()> {
        let mut data = b"LAME3.88 (beta)".to_vec();
        data.resize(SIMPLE_TAG_SIZE, 0);
        let mut stream = SliceStream::from_slice(&data);

        let tag = LameTag::find(&mut stream, 0)?.expect("LAME tag");
        assert_eq!(tag.encoder, "LAME3.88 (beta)");
        assert_eq!(tag.version.to_string(), "3.88");
        assert_eq!(tag.info, None);
        Ok(())
    }

    #[test]
    fn absent_or_truncated_tags_are_none() -> anyhow::Result<()> {
        let data = b"GOGO3.99r and some more bytes after it....".to_vec();
        let mut stream = SliceStream::from_slice(&data);
        assert_eq!(LameTag::find(&mut stream, 0)?, None);

        let truncated = full_tag(b"LAME3.99r")[..20].to_vec();
        let mut stream = SliceStream::from_slice(&truncated);
        assert_eq!(LameTag::find(&mut stream, 0)?, None);
        Ok(())
    }

    #[test]
    fn vbr_methods() {
        assert_eq!(VbrMethod::from(1), VbrMethod::Cbr);
        assert_eq!(VbrMethod::from(6), VbrMethod::Vbr4);
        assert_eq!(VbrMethod::from(7), VbrMethod::Reserved(7));
        assert_eq!(VbrMethod::from(9), VbrMethod::Abr2Pass);
        assert_eq!(VbrMethod::from(15).to_string(), "Reserved (15)");
    }
}
