//! Synthetic stream builders for unit tests.

use crate::structs::header::{ChannelMode, Emphasis, Layer, MpaHeader, MpegVersion};
use crate::utils::crc::MPEG_AUDIO_CRC;

#[derive(Debug, Clone, Copy)]
pub struct HeaderSpec {
    pub version: MpegVersion,
    pub layer: Layer,
    pub crc: bool,
    pub bitrate_index: u8,
    pub sample_rate_index: u8,
    pub padding: bool,
    pub channel_mode: ChannelMode,
    pub mode_extension: u8,
    pub emphasis: Emphasis,
}

impl Default for HeaderSpec {
    /// MPEG 1 Layer III, 128 kbps, 44.1 kHz, stereo: 417 byte frames.
    fn default() -> Self {
        Self {
            version: MpegVersion::Mpeg1,
            layer: Layer::Layer3,
            crc: false,
            bitrate_index: 9,
            sample_rate_index: 0,
            padding: false,
            channel_mode: ChannelMode::Stereo,
            mode_extension: 0,
            emphasis: Emphasis::None,
        }
    }
}

impl HeaderSpec {
    pub fn encode(&self) -> [u8; 4] {
        let version: u32 = match self.version {
            MpegVersion::Mpeg25 => 0b00,
            MpegVersion::Mpeg2 => 0b10,
            MpegVersion::Mpeg1 => 0b11,
        };
        let layer: u32 = match self.layer {
            Layer::Layer1 => 0b11,
            Layer::Layer2 => 0b10,
            Layer::Layer3 => 0b01,
        };
        let mode: u32 = match self.channel_mode {
            ChannelMode::Stereo => 0b00,
            ChannelMode::JointStereo => 0b01,
            ChannelMode::DualChannel => 0b10,
            ChannelMode::SingleChannel => 0b11,
        };
        let emphasis: u32 = match self.emphasis {
            Emphasis::None => 0b00,
            Emphasis::Ms50_15 => 0b01,
            Emphasis::CcittJ17 => 0b11,
        };

        let word: u32 = (0x7FF << 21)
            | (version << 19)
            | (layer << 17)
            | (u32::from(!self.crc) << 16)
            | (u32::from(self.bitrate_index) << 12)
            | (u32::from(self.sample_rate_index) << 10)
            | (u32::from(self.padding) << 9)
            | (mode << 6)
            | (u32::from(self.mode_extension) << 4)
            | emphasis;

        word.to_be_bytes()
    }

    pub fn header(&self) -> MpaHeader {
        MpaHeader::decode(self.encode()).expect("header spec must be legal")
    }

    /// A whole frame: header followed by a zeroed payload.
    pub fn frame(&self) -> Vec<u8> {
        let mut frame = vec![0u8; self.header().frame_size() as usize];
        frame[..4].copy_from_slice(&self.encode());
        frame
    }

    /// A frame with a noise payload and a valid CRC word.
    pub fn frame_with_crc(&self, seed: u64) -> Vec<u8> {
        let spec = Self { crc: true, ..*self };
        let header = spec.header();

        let mut frame = noise(header.frame_size() as usize, seed);
        frame[..4].copy_from_slice(&spec.encode());

        let protected = protected_bytes(&header);
        let crc = MPEG_AUDIO_CRC.update(MPEG_AUDIO_CRC.init, &frame[2..4]);
        let crc = MPEG_AUDIO_CRC.update(crc, &frame[6..6 + protected]);
        frame[4..6].copy_from_slice(&crc.to_be_bytes());
        frame
    }

    pub fn frames(&self, count: usize) -> Vec<u8> {
        self.frame().repeat(count)
    }
}

/// Protected bytes after the CRC word, for layouts that end on a byte.
pub fn protected_bytes(header: &MpaHeader) -> usize {
    match header.layer {
        Layer::Layer1 if header.is_mono() => 16,
        Layer::Layer1 => (32 + header.bound as usize) / 2,
        Layer::Layer2 => 0,
        Layer::Layer3 => header.side_info_size() as usize,
    }
}

/// Deterministic filler that never contains `0xFF`, so it holds no sync.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((state >> 33) % 0xFF) as u8
        })
        .collect()
}

/// A full LAME tag: VBR method 1 at 128 kbps, delay 576, padding 1600.
pub fn lame_tag(encoder: &[u8; 9]) -> Vec<u8> {
    let mut tag = encoder.to_vec();
    tag.push(0x13); // revision 1, VBR method 3
    tag.push(195); // 19.5 kHz
    tag.extend([0u8; 8]);
    tag.push(0);
    tag.push(128);
    tag.extend([0x24, 0x06, 0x40]);
    tag.extend([0u8; 4]);
    tag.extend(1_000_000u32.to_be_bytes());
    tag.extend([0u8; 4]);
    tag
}

pub fn id3v1_tag(track: Option<u8>) -> Vec<u8> {
    let mut tag = b"TAG".to_vec();
    tag.extend([b'a'; 30]); // title
    tag.extend([b'b'; 30]); // artist
    tag.extend([b'c'; 30]); // album
    tag.extend(b"1999");
    match track {
        Some(track) => {
            tag.extend([b'd'; 28]);
            tag.extend([0, track]);
        }
        None => tag.extend([b'd'; 30]),
    }
    tag.push(12); // genre
    tag
}

/// ID3v2.4 tag with a zeroed body of `body` bytes.
pub fn id3v2_tag(body: u32, footer: bool) -> Vec<u8> {
    let flags = if footer { 0x10 } else { 0 };
    let size = crate::structs::tag::id3v2::encode_synchsafe(body);

    let mut tag = b"ID3".to_vec();
    tag.extend([4, 0, flags]);
    tag.extend(size);
    tag.extend(vec![0u8; body as usize]);
    if footer {
        tag.extend(b"3DI");
        tag.extend([4, 0, flags]);
        tag.extend(size);
    }
    tag
}

/// APE tag of `tag_size` bytes (items and footer) holding three items.
pub fn ape_tag(version: u32, tag_size: u32, header: bool) -> Vec<u8> {
    let block = |flags: u32| {
        let mut block = b"APETAGEX".to_vec();
        block.extend(version.to_le_bytes());
        block.extend(tag_size.to_le_bytes());
        block.extend(3u32.to_le_bytes());
        block.extend(flags.to_le_bytes());
        block.extend([0u8; 8]);
        block
    };
    let has_header = if header { 1 << 31 } else { 0 };

    let mut tag = Vec::new();
    if header {
        tag.extend(block(has_header | 1 << 29));
    }
    tag.extend(vec![0u8; tag_size as usize - 32]);
    tag.extend(block(has_header));
    tag
}

/// MusicMatch tag with an `image` byte picture section.
pub fn musicmatch_tag(metadata_size: usize, image: usize, header: bool) -> Vec<u8> {
    let block = || {
        let mut block = b"18273645".to_vec();
        block.resize(256, 0);
        block
    };

    let mut tag = Vec::new();
    if header {
        tag.extend(block());
    }

    // offsets are relative to an arbitrary origin, only differences count
    let image_extension = 5000 + tag.len() as u32;
    let image_binary = image_extension + 4;
    let unused = image_binary + image as u32;
    let version_info = unused + 4;
    let metadata = version_info + 256;

    tag.extend(b"jpg ");
    tag.extend(vec![0u8; image]);
    tag.extend([0u8; 4]);
    tag.extend(block());
    tag.extend(vec![0u8; metadata_size]);
    for offset in [image_extension, image_binary, unused, version_info, metadata] {
        tag.extend(offset.to_le_bytes());
    }
    tag.extend(crate::structs::tag::musicmatch::SIGNATURE);
    tag.extend(b"3.05");
    tag.extend([b' '; 12]);
    tag
}
