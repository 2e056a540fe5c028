//! Utility functions and supporting infrastructure.
//!
//! Provides byte stream access, bitstream I/O, CRC validation and error
//! handling for the parsers.

pub mod bitstream_io;
pub mod crc;
pub mod errors;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;
