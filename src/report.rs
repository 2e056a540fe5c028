use serde::Serialize;

use mpa::process::file::MpaFile;
use mpa::structs::frame::MpaFrame;
use mpa::structs::lame::LameTag;
use mpa::structs::tag::{Tag, TagKind};
use mpa::structs::vbr::VbrHeader;
use mpa::utils::stream::ByteStream;

use crate::timestamp::time_str;

/// Everything `info` knows about a file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub audio_begin: u64,
    pub audio_end: u64,
    pub tags: Vec<TagReport>,
    pub first_frame: FrameReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vbr: Option<VbrReport>,
    pub bytes_per_second: u32,
    pub length_seconds: f64,
    pub length: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReport {
    #[serde(rename = "type")]
    pub tag_type: &'static str,
    pub version: String,
    pub offset: u64,
    pub size: u64,
    pub position: Position,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Start,
    End,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub offset: u64,
    pub size: u32,
    pub version: String,
    pub layer: String,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub channel_mode: &'static str,
    pub samples_per_frame: u32,
    pub crc: bool,
    pub emphasis: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VbrReport {
    #[serde(rename = "type")]
    pub header_type: &'static str,
    pub frames: u32,
    pub bytes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lame: Option<LameReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LameReport {
    pub encoder: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vbr_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoder_delay: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoder_padding: Option<u16>,
}

impl FileReport {
    pub fn from_file<S: ByteStream>(file: &MpaFile<S>) -> Self {
        let length_seconds = file.length_seconds();

        Self {
            audio_begin: file.begin(),
            audio_end: file.end(),
            tags: file.tags().iter().map(TagReport::from).collect(),
            first_frame: FrameReport::from(file.first_frame()),
            vbr: file.vbr_header().map(VbrReport::from),
            bytes_per_second: file.bytes_per_second(),
            length_seconds,
            length: time_str(length_seconds),
        }
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

impl From<&Tag> for TagReport {
    fn from(tag: &Tag) -> Self {
        let details = match &tag.kind {
            TagKind::Id3v1(id3v1) => id3v1
                .track
                .map(|track| vec![format!("track {track}")])
                .unwrap_or_default(),
            TagKind::Id3v2(flags) => [
                (flags.unsynchronisation, "unsynchronisation"),
                (flags.extended_header, "extended header"),
                (flags.experimental, "experimental"),
                (flags.footer, "footer"),
            ]
            .into_iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| name.to_string())
            .collect(),
            TagKind::Ape(ape) => {
                let mut details = vec![format!("{} items", ape.items)];
                if ape.has_header {
                    details.push("header".to_string());
                }
                details
            }
            TagKind::Lyrics3 => Vec::new(),
            TagKind::MusicMatch(info) => {
                let mut details = vec![format!("{} byte metadata", info.metadata_size)];
                if info.has_header {
                    details.push("header".to_string());
                }
                details
            }
        };

        Self {
            tag_type: tag.name(),
            version: tag.version.to_string(),
            offset: tag.offset,
            size: tag.size,
            position: if tag.appended {
                Position::End
            } else {
                Position::Start
            },
            details,
        }
    }
}

impl From<&MpaFrame> for FrameReport {
    fn from(frame: &MpaFrame) -> Self {
        let header = &frame.header;
        Self {
            offset: frame.offset,
            size: frame.size,
            version: header.version.to_string(),
            layer: header.layer.to_string(),
            bitrate_kbps: header.bitrate_kbps(),
            sample_rate: header.sample_rate,
            channel_mode: header.channel_mode.as_str(),
            samples_per_frame: header.samples_per_frame(),
            crc: header.crc_present,
            emphasis: header.emphasis.to_string(),
        }
    }
}

impl From<&VbrHeader> for VbrReport {
    fn from(vbr: &VbrHeader) -> Self {
        Self {
            header_type: vbr.name(),
            frames: vbr.frames(),
            bytes: vbr.bytes(),
            lame: vbr.lame().map(LameReport::from),
        }
    }
}

impl From<&LameTag> for LameReport {
    fn from(lame: &LameTag) -> Self {
        let info = lame.info.as_ref();
        Self {
            encoder: lame.encoder.clone(),
            version: lame.version.to_string(),
            vbr_method: info.map(|info| info.vbr_method.to_string()),
            encoder_delay: info.map(|info| info.encoder_delay),
            encoder_padding: info.map(|info| info.encoder_padding),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpa::process::Options;
    use mpa::utils::stream::SliceStream;

    /// MPEG-1 Layer III, 128 kbps, 44.1 kHz, joint stereo: 417 byte frames.
    fn frames(count: usize) -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        frame.repeat(count)
    }

    fn id3v1() -> Vec<u8> {
        let mut tag = vec![0u8; 128];
        tag[..3].copy_from_slice(b"TAG");
        tag[126] = 7;
        tag
    }

    #[test]
    fn cbr_report() -> anyhow::Result<()> {
        let mut data = frames(50);
        data.extend(id3v1());

        let file = MpaFile::from_stream(SliceStream::from_slice(&data), Options::default())?;
        let report = FileReport::from_file(&file);

        assert_eq!(report.audio_end, 50 * 417);
        assert_eq!(report.tags.len(), 1);
        assert_eq!(report.tags[0].tag_type, "ID3v1");
        assert_eq!(report.tags[0].details, ["track 7"]);
        assert_eq!(report.first_frame.bitrate_kbps, 128);
        assert_eq!(report.first_frame.channel_mode, "Joint Stereo");
        assert!(report.vbr.is_none());
        assert_eq!(report.bytes_per_second, 16_000);
        assert_eq!(report.length, "00:00:01.303");

        let yaml = report.to_yaml()?;
        assert!(yaml.contains("audioBegin: 0\n"));
        assert!(yaml.contains("type: ID3v1\n"));
        assert!(yaml.contains("position: end\n"));
        assert!(!yaml.contains("vbr:"));
        Ok(())
    }

    #[test]
    fn xing_report() -> anyhow::Result<()> {
        let mut data = frames(20);
        let mut xing = b"Info".to_vec();
        xing.extend(0x3u32.to_be_bytes());
        xing.extend(200u32.to_be_bytes());
        xing.extend(83_400u32.to_be_bytes());
        data[36..36 + xing.len()].copy_from_slice(&xing);

        let file = MpaFile::from_stream(SliceStream::from_slice(&data), Options::default())?;
        let report = FileReport::from_file(&file);

        let vbr = report.vbr.as_ref().expect("VBR header");
        assert_eq!((vbr.header_type, vbr.frames, vbr.bytes), ("Info", 200, 83_400));
        assert!(vbr.lame.is_none());
        Ok(())
    }
}
