//! Data structures representing format components.
//!
//! Contains structured representations of the frame header, located frames,
//! the VBR headers found in the first frame, the LAME extension, and the tags
//! stored around the audio.

pub mod frame;
pub mod header;
pub mod lame;
pub mod tag;
pub mod vbr;
