//! Inspection of MPEG-1, MPEG-2 and MPEG-2.5 audio files (Layers I, II and III).
//!
//! ## Technical Overview
//!
//! An MPEG audio stream is a sequence of self-contained frames, each starting
//! with a 4 byte header carrying an 11 bit sync word. Nothing ties the frames
//! together, so a parser has to find them by pattern matching and confirm a
//! candidate by looking for the next frame where its size says it should be.
//!
//! ### Stream Organization
//!
//! **Tags**: ID3v2 and APE tags may precede the audio. ID3v1, ID3v2 (with
//! footer), APE, Lyrics3 and MusicMatch tags may follow it, stacked in any
//! order.
//! **Frames**: Headers with optional CRC-16, followed by side information
//! and audio data.
//! **VBR headers**: The first frame of a variable bitrate file may instead
//! hold a XING (`Xing`/`Info`) or VBRI header with frame and byte counts and a
//! seek table. LAME stores an extension right after the XING header.
//!
//! ## Quick Start
//!
//! 1. Open a file with [`process::file::MpaFile`]. Tags are stripped, the first
//!    frame is located and the average bitrate is estimated.
//! 2. Walk frames with [`process::file::FrameRequest`].
//!
//! ```rust,no_run
//! use mpa::process::file::{FrameRequest, MpaFile};
//!
//! let mut file = MpaFile::open("track.mp3")?;
//! for tag in file.tags() {
//!     println!("{tag}");
//! }
//! if let Some(vbr) = file.vbr_header() {
//!     println!("{vbr}");
//! }
//! println!("{:.2} s", file.length_seconds());
//!
//! if let Some(last) = file.frame(FrameRequest::Last)? {
//!     println!("last frame at {}", last.offset);
//! }
//! # Ok::<(), mpa::utils::errors::MpaError>(())
//! ```

/// File level processing.
///
/// 1. **Tags** ([`process::tags`]): Strips tags off both ends of the stream.
///
/// 2. **Resync** ([`process::resync`]): Locates frame headers near an offset.
///
/// 3. **Files** ([`process::file`]): First frame, VBR header, duration and
///    frame navigation.
pub mod process;

/// Data structures representing MPEG audio components.
///
/// - **Headers** ([`structs::header`]): Frame header decoding and frame sizes
/// - **Frames** ([`structs::frame`]): Located frames and CRC checks
/// - **VBR Headers** ([`structs::vbr`]): XING and VBRI headers
/// - **LAME Tags** ([`structs::lame`]): Encoder extension of the XING header
/// - **Tags** ([`structs::tag`]): ID3v1, ID3v2, APE, Lyrics3 and MusicMatch
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Streams** ([`utils::stream`]): Cached random access to bytes
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **CRC Validation** ([`utils::crc`]): Error detection
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
