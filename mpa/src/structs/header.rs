//! MPEG audio frame header.
//!
//! ## Layout
//!
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//! ```
//!
//! - **A** (11): frame sync, all bits set
//! - **B** (2): version: `00` MPEG 2.5, `01` reserved, `10` MPEG 2, `11` MPEG 1
//! - **C** (2): layer: `00` reserved, `01` III, `10` II, `11` I
//! - **D** (1): protection, `0` when a 16-bit CRC follows the header
//! - **E** (4): bitrate index, **F** (2): sample rate index
//! - **G** padding, **H** private
//! - **I** (2): channel mode, **J** (2): mode extension
//! - **K** copyright, **L** original, **M** (2): emphasis
//!
//! Reserved patterns are rejected; nothing is defaulted.

use std::fmt::{self, Display};

use crate::utils::errors::HeaderError;

/// Size of the fixed frame header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Smallest legal frame: MPEG 2 Layer III at 8 kbps and 24 kHz.
pub const MIN_FRAME_SIZE: u64 = 24;

/// Number of subbands in Layer I and Layer II.
pub const SUBBANDS: u8 = 32;

/// Bitrates in kbps, indexed by `[lsf][layer][index]`.
const BITRATES: [[[u32; 15]; 3]; 2] = [
    [
        [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
        [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
    ],
    [
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
    ],
];

/// Sample rates in Hz, indexed by `[version][index]`.
const SAMPLE_RATES: [[u32; 3]; 3] = [
    [44100, 48000, 32000],
    [22050, 24000, 16000],
    [11025, 12000, 8000],
];

/// Frame size coefficients, indexed by `[lsf][layer]`.
const COEFFICIENTS: [[u32; 3]; 2] = [[12, 144, 144], [12, 144, 72]];

/// Slot size in bytes, indexed by layer.
const SLOT_SIZES: [u32; 3] = [4, 1, 1];

const SAMPLES_PER_FRAME: [[u32; 3]; 2] = [[384, 1152, 1152], [384, 1152, 576]];

/// Layer III side information size, indexed by `[lsf][mono]`.
const SIDE_INFO_SIZES: [[u32; 2]; 2] = [[32, 17], [17, 9]];

/// MPEG 1 Layer II: whether a bitrate index is allowed for `[non-mono, mono]`.
const LAYER2_ALLOWED_MODES: [[bool; 2]; 15] = [
    [true, true],
    [false, true],
    [false, true],
    [false, true],
    [true, true],
    [false, true],
    [true, true],
    [true, true],
    [true, true],
    [true, true],
    [true, true],
    [true, false],
    [true, false],
    [true, false],
    [true, false],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

impl MpegVersion {
    fn index(self) -> usize {
        match self {
            Self::Mpeg1 => 0,
            Self::Mpeg2 => 1,
            Self::Mpeg25 => 2,
        }
    }
}

impl Display for MpegVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mpeg1 => "MPEG 1",
            Self::Mpeg2 => "MPEG 2",
            Self::Mpeg25 => "MPEG 2.5",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Layer1,
    Layer2,
    Layer3,
}

impl Layer {
    fn index(self) -> usize {
        match self {
            Self::Layer1 => 0,
            Self::Layer2 => 1,
            Self::Layer3 => 2,
        }
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Layer1 => "Layer I",
            Self::Layer2 => "Layer II",
            Self::Layer3 => "Layer III",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    SingleChannel,
}

impl ChannelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stereo => "Stereo",
            Self::JointStereo => "Joint Stereo",
            Self::DualChannel => "Dual Channel",
            Self::SingleChannel => "Single Channel",
        }
    }
}

impl Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    None,
    /// 50/15 ms
    Ms50_15,
    CcittJ17,
}

impl Display for Emphasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "None",
            Self::Ms50_15 => "50/15 ms",
            Self::CcittJ17 => "CCITT J.17",
        })
    }
}

/// A decoded 32-bit frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpaHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    pub crc_present: bool,
    /// Bits per second.
    pub bitrate: u32,
    /// Hz.
    pub sample_rate: u32,
    pub padding: bool,
    pub private: bool,
    pub channel_mode: ChannelMode,
    pub mode_extension: u8,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: Emphasis,
    /// First subband coded in intensity stereo (Layer I and II).
    pub bound: u8,
    /// Layer II bit allocation table, one of `0..=4`.
    pub allocation_table: Option<u8>,
}

/// Cheap check of a candidate window before a full decode.
///
/// Besides the sync word, rejects a third byte with its top four bits set:
/// a run of set bits is far more likely padding than a real header.
#[inline(always)]
pub fn is_sync_candidate(bytes: &[u8; HEADER_SIZE]) -> bool {
    bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0 && bytes[2] & 0xF0 != 0xF0
}

impl MpaHeader {
    pub fn decode(bytes: [u8; HEADER_SIZE]) -> Result<Self, HeaderError> {
        let data = u32::from_be_bytes(bytes);

        if data >> 21 != 0x7FF {
            return Err(HeaderError::NoSync((data >> 16) as u16));
        }

        let version = match (data >> 19) & 0b11 {
            0b00 => MpegVersion::Mpeg25,
            0b10 => MpegVersion::Mpeg2,
            0b11 => MpegVersion::Mpeg1,
            _ => return Err(HeaderError::ReservedVersion),
        };

        let layer = match (data >> 17) & 0b11 {
            0b01 => Layer::Layer3,
            0b10 => Layer::Layer2,
            0b11 => Layer::Layer1,
            _ => return Err(HeaderError::ReservedLayer),
        };

        let crc_present = (data >> 16) & 1 == 0;

        let lsf = usize::from(version != MpegVersion::Mpeg1);
        let bitrate_index = ((data >> 12) & 0xF) as usize;
        let bitrate_kbps = match bitrate_index {
            0 => return Err(HeaderError::FreeBitrate),
            15 => return Err(HeaderError::ReservedBitrate),
            i => BITRATES[lsf][layer.index()][i],
        };

        let sample_rate = match (data >> 10) & 0b11 {
            0b11 => return Err(HeaderError::ReservedSampleRate),
            i => SAMPLE_RATES[version.index()][i as usize],
        };

        let padding = (data >> 9) & 1 == 1;
        let private = (data >> 8) & 1 == 1;

        let channel_mode = match (data >> 6) & 0b11 {
            0b00 => ChannelMode::Stereo,
            0b01 => ChannelMode::JointStereo,
            0b10 => ChannelMode::DualChannel,
            _ => ChannelMode::SingleChannel,
        };

        let mode_extension = ((data >> 4) & 0b11) as u8;
        let copyright = (data >> 3) & 1 == 1;
        let original = (data >> 2) & 1 == 1;

        let emphasis = match data & 0b11 {
            0b00 => Emphasis::None,
            0b01 => Emphasis::Ms50_15,
            0b11 => Emphasis::CcittJ17,
            _ => return Err(HeaderError::ReservedEmphasis),
        };

        let bound = if channel_mode == ChannelMode::JointStereo && layer != Layer::Layer3 {
            4 + mode_extension * 4
        } else {
            SUBBANDS
        };

        let mut header = Self {
            version,
            layer,
            crc_present,
            bitrate: bitrate_kbps * 1000,
            sample_rate,
            padding,
            private,
            channel_mode,
            mode_extension,
            copyright,
            original,
            emphasis,
            bound,
            allocation_table: None,
        };

        if layer == Layer::Layer2 {
            if lsf == 0 && !LAYER2_ALLOWED_MODES[bitrate_index][usize::from(header.is_mono())] {
                return Err(HeaderError::DisallowedLayer2Mode {
                    bitrate: bitrate_kbps,
                    mode: channel_mode.as_str(),
                });
            }

            header.allocation_table = Some(header.select_allocation_table());
        }

        Ok(header)
    }

    fn select_allocation_table(&self) -> u8 {
        if self.is_lsf() {
            return 4;
        }

        let per_channel = self.bitrate_kbps() / self.channels();
        if (self.sample_rate == 48000 && per_channel >= 56) || (56..=80).contains(&per_channel) {
            0
        } else if self.sample_rate != 48000 && per_channel >= 96 {
            1
        } else if self.sample_rate != 32000 && per_channel <= 48 {
            2
        } else {
            3
        }
    }

    /// Lower sampling frequencies: MPEG 2 and MPEG 2.5.
    pub fn is_lsf(&self) -> bool {
        self.version != MpegVersion::Mpeg1
    }

    pub fn is_mono(&self) -> bool {
        self.channel_mode == ChannelMode::SingleChannel
    }

    pub fn channels(&self) -> u32 {
        if self.is_mono() { 1 } else { 2 }
    }

    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate / 1000
    }

    pub fn samples_per_frame(&self) -> u32 {
        SAMPLES_PER_FRAME[usize::from(self.is_lsf())][self.layer.index()]
    }

    /// Layer III side information size in bytes, 0 for the other layers.
    pub fn side_info_size(&self) -> u32 {
        if self.layer != Layer::Layer3 {
            return 0;
        }

        SIDE_INFO_SIZES[usize::from(self.is_lsf())][usize::from(self.is_mono())]
    }

    /// Frame size in bytes, header included.
    pub fn frame_size(&self) -> u32 {
        let layer = self.layer.index();
        let coefficient = COEFFICIENTS[usize::from(self.is_lsf())][layer];
        let slots = (u64::from(coefficient) * u64::from(self.bitrate) / u64::from(self.sample_rate))
            as u32
            + u32::from(self.padding);

        slots * SLOT_SIZES[layer]
    }

    /// Fields that cannot change between frames of one stream.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.version == other.version
            && self.layer == other.layer
            && self.sample_rate == other.sample_rate
            && self.is_mono() == other.is_mono()
            && self.emphasis == other.emphasis
    }
}

impl Display for MpaHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} kbps, {} Hz, {}",
            self.version,
            self.layer,
            self.bitrate_kbps(),
            self.sample_rate,
            self.channel_mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::HeaderSpec;

    #[test]
    fn decodes_mpeg1_layer3_128k() -> anyhow::Result<()> {
        let header = MpaHeader::decode([0xFF, 0xFB, 0x90, 0x64])?;

        assert_eq!(header.version, MpegVersion::Mpeg1);
        assert_eq!(header.layer, Layer::Layer3);
        assert_eq!(header.bitrate, 128_000);
        assert_eq!(header.sample_rate, 44100);
        // mode bits `01`
        assert_eq!(header.channel_mode, ChannelMode::JointStereo);
        assert!(!header.is_mono());
        assert!(!header.padding);
        assert!(!header.crc_present);
        assert_eq!(header.frame_size(), 417);
        assert_eq!(header.side_info_size(), 32);
        assert_eq!(header.samples_per_frame(), 1152);
        Ok(())
    }

    #[test]
    fn every_legal_combination_survives_encoding() {
        let versions = [MpegVersion::Mpeg1, MpegVersion::Mpeg2, MpegVersion::Mpeg25];
        let layers = [Layer::Layer1, Layer::Layer2, Layer::Layer3];
        let modes = [
            ChannelMode::Stereo,
            ChannelMode::JointStereo,
            ChannelMode::DualChannel,
            ChannelMode::SingleChannel,
        ];
        let emphases = [Emphasis::None, Emphasis::Ms50_15, Emphasis::CcittJ17];

        let mut decoded = 0;
        for version in versions {
            for layer in layers {
                for bitrate_index in 1..15 {
                    for sample_rate_index in 0..3 {
                        for mode in modes {
                            for emphasis in emphases {
                                let spec = HeaderSpec {
                                    version,
                                    layer,
                                    bitrate_index,
                                    sample_rate_index,
                                    channel_mode: mode,
                                    emphasis,
                                    ..Default::default()
                                };

                                let Ok(header) = MpaHeader::decode(spec.encode()) else {
                                    assert_eq!(layer, Layer::Layer2);
                                    assert_eq!(version, MpegVersion::Mpeg1);
                                    continue;
                                };

                                let lsf = usize::from(version != MpegVersion::Mpeg1);
                                assert_eq!(header.version, version);
                                assert_eq!(header.layer, layer);
                                assert_eq!(
                                    header.bitrate,
                                    BITRATES[lsf][layer.index()][bitrate_index as usize] * 1000
                                );
                                assert_eq!(
                                    header.sample_rate,
                                    SAMPLE_RATES[version.index()][sample_rate_index as usize]
                                );
                                assert_eq!(header.channel_mode, mode);
                                assert_eq!(header.emphasis, emphasis);
                                assert!(u64::from(header.frame_size()) >= MIN_FRAME_SIZE);
                                decoded += 1;
                            }
                        }
                    }
                }
            }
        }

        // 3 * 3 * 14 * 3 * 4 * 3 combinations minus the MPEG 1 Layer II
        // pairs that are not allowed (4 bitrates * 3 stereo modes + 4 mono).
        assert_eq!(decoded, 4536 - (4 * 3 + 4) * 3 * 3);
    }

    #[test]
    fn rejects_reserved_patterns() {
        let base = [0xFF, 0xFB, 0x90, 0x64];

        let mut version = base;
        version[1] = 0xEB;
        assert_eq!(MpaHeader::decode(version), Err(HeaderError::ReservedVersion));

        let mut layer = base;
        layer[1] = 0xF9;
        assert_eq!(MpaHeader::decode(layer), Err(HeaderError::ReservedLayer));

        let mut free = base;
        free[2] = 0x00;
        assert_eq!(MpaHeader::decode(free), Err(HeaderError::FreeBitrate));

        let mut bad_bitrate = base;
        bad_bitrate[2] = 0xF0;
        assert_eq!(MpaHeader::decode(bad_bitrate), Err(HeaderError::ReservedBitrate));

        let mut sample_rate = base;
        sample_rate[2] = 0x9C;
        assert_eq!(MpaHeader::decode(sample_rate), Err(HeaderError::ReservedSampleRate));

        let mut emphasis = base;
        emphasis[3] = 0x66;
        assert_eq!(MpaHeader::decode(emphasis), Err(HeaderError::ReservedEmphasis));

        assert!(matches!(
            MpaHeader::decode([0xFE, 0xFB, 0x90, 0x64]),
            Err(HeaderError::NoSync(_))
        ));
    }

    #[test]
    fn layer2_mode_restrictions() {
        let mono_only = HeaderSpec {
            layer: Layer::Layer2,
            bitrate_index: 1,
            channel_mode: ChannelMode::Stereo,
            ..Default::default()
        };
        assert!(matches!(
            MpaHeader::decode(mono_only.encode()),
            Err(HeaderError::DisallowedLayer2Mode { bitrate: 32, .. })
        ));

        let stereo_only = HeaderSpec {
            layer: Layer::Layer2,
            bitrate_index: 14,
            channel_mode: ChannelMode::SingleChannel,
            ..Default::default()
        };
        assert!(MpaHeader::decode(stereo_only.encode()).is_err());

        let lsf = HeaderSpec {
            version: MpegVersion::Mpeg2,
            ..stereo_only
        };
        assert_eq!(
            MpaHeader::decode(lsf.encode()).map(|h| h.allocation_table),
            Ok(Some(4))
        );
    }

    #[test]
    fn layer2_allocation_tables() {
        let table = |bitrate_index, sample_rate_index, channel_mode| {
            let spec = HeaderSpec {
                layer: Layer::Layer2,
                bitrate_index,
                sample_rate_index,
                channel_mode,
                ..Default::default()
            };
            MpaHeader::decode(spec.encode()).map(|h| h.allocation_table.unwrap_or(u8::MAX))
        };

        // 128 kbps stereo = 64 kbps per channel
        assert_eq!(table(8, 0, ChannelMode::Stereo), Ok(0));
        // 192 kbps mono at 44.1 kHz
        assert_eq!(table(10, 0, ChannelMode::SingleChannel), Ok(1));
        // 192 kbps mono at 48 kHz
        assert_eq!(table(10, 1, ChannelMode::SingleChannel), Ok(0));
        // 32 kbps mono at 44.1 kHz and at 32 kHz
        assert_eq!(table(1, 0, ChannelMode::SingleChannel), Ok(2));
        assert_eq!(table(1, 2, ChannelMode::SingleChannel), Ok(3));
    }

    #[test]
    fn joint_stereo_bound() -> anyhow::Result<()> {
        let spec = HeaderSpec {
            layer: Layer::Layer1,
            channel_mode: ChannelMode::JointStereo,
            mode_extension: 2,
            ..Default::default()
        };
        assert_eq!(MpaHeader::decode(spec.encode())?.bound, 12);

        let stereo = HeaderSpec {
            layer: Layer::Layer1,
            ..Default::default()
        };
        assert_eq!(MpaHeader::decode(stereo.encode())?.bound, SUBBANDS);
        Ok(())
    }

    #[test]
    fn compatibility_ignores_bitrate_and_stereo_flavour() -> anyhow::Result<()> {
        let a = MpaHeader::decode(HeaderSpec::default().encode())?;
        let b = MpaHeader::decode(
            HeaderSpec {
                bitrate_index: 3,
                channel_mode: ChannelMode::JointStereo,
                padding: true,
                ..Default::default()
            }
            .encode(),
        )?;
        let mono = MpaHeader::decode(
            HeaderSpec {
                channel_mode: ChannelMode::SingleChannel,
                ..Default::default()
            }
            .encode(),
        )?;
        let other_rate = MpaHeader::decode(
            HeaderSpec {
                sample_rate_index: 1,
                ..Default::default()
            }
            .encode(),
        )?;

        assert!(a.is_compatible(&b));
        assert!(!a.is_compatible(&mono));
        assert!(!a.is_compatible(&other_rate));
        Ok(())
    }

    #[test]
    fn frame_size_is_deterministic() -> anyhow::Result<()> {
        let spec = HeaderSpec {
            padding: true,
            ..Default::default()
        };
        let first = MpaHeader::decode(spec.encode())?.frame_size();
        let second = MpaHeader::decode(spec.encode())?.frame_size();
        assert_eq!(first, second);
        assert_eq!(first, 418);

        let layer1 = HeaderSpec {
            layer: Layer::Layer1,
            bitrate_index: 4,
            padding: true,
            ..Default::default()
        };
        // (12 * 128000 / 44100 + 1) * 4
        assert_eq!(MpaHeader::decode(layer1.encode())?.frame_size(), 140);

        let smallest = HeaderSpec {
            version: MpegVersion::Mpeg2,
            bitrate_index: 1,
            sample_rate_index: 1,
            ..Default::default()
        };
        assert_eq!(
            u64::from(MpaHeader::decode(smallest.encode())?.frame_size()),
            MIN_FRAME_SIZE
        );
        Ok(())
    }

    #[test]
    fn sync_prefilter() {
        assert!(is_sync_candidate(&[0xFF, 0xFB, 0x90, 0x64]));
        assert!(!is_sync_candidate(&[0xFF, 0xDB, 0x90, 0x64]));
        assert!(!is_sync_candidate(&[0xFF, 0xFF, 0xFF, 0xFF]));
        assert!(!is_sync_candidate(&[0x00, 0xFB, 0x90, 0x64]));
    }
}
