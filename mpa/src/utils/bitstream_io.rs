//! Bit-level reading for CRC ranges.

use std::io;
use std::io::SeekFrom;

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::utils::crc::Crc16;

const STACK_BUF_SIZE: usize = 256;

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    /// Continues `checksum` over `len` bits starting at bit `start`.
    ///
    /// The read position is restored afterwards.
    #[inline(always)]
    pub fn crc16_update(
        &mut self,
        crc: &Crc16,
        mut checksum: u16,
        start: u64,
        len: u64,
    ) -> io::Result<u16> {
        let position = self.position()?;

        if start + len > self.len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "crc16_update: out of bounds bits",
            ));
        }

        self.bs.seek_bits(SeekFrom::Start(start))?;

        let prefix_len = ((8 - (start & 7)) & 7).min(len);
        let suffix_len = (len - prefix_len) & 7;
        let middle_len = (len - prefix_len - suffix_len) as usize;

        if prefix_len != 0 {
            let prefix: u32 = self.bs.read_var(prefix_len as u32)?;
            checksum = crc.update_bits(checksum, prefix, prefix_len as u32);
        }

        let bytes_len = middle_len >> 3;
        if bytes_len <= STACK_BUF_SIZE {
            let mut stack_buf = [0u8; STACK_BUF_SIZE];
            let buf = &mut stack_buf[..bytes_len];
            self.bs.read_bytes(buf)?;
            checksum = crc.update(checksum, buf);
        } else {
            let mut heap_buf = vec![0; bytes_len];
            self.bs.read_bytes(&mut heap_buf)?;
            checksum = crc.update(checksum, &heap_buf);
        };

        if suffix_len != 0 {
            let suffix: u32 = self.bs.read_var(suffix_len as u32)?;
            checksum = crc.update_bits(checksum, suffix, suffix_len as u32);
        }

        self.bs.seek_bits(SeekFrom::Start(position))?;

        Ok(checksum)
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crc::MPEG_AUDIO_CRC;

    #[test]
    fn unaligned_crc_matches_aligned() -> anyhow::Result<()> {
        let data = [0xA5u8, 0x3C, 0x0F, 0xF0, 0x99];
        let mut reader = BsIoSliceReader::from_slice(&data);

        let aligned = reader.crc16_update(&MPEG_AUDIO_CRC, MPEG_AUDIO_CRC.init, 8, 24)?;
        assert_eq!(
            aligned,
            MPEG_AUDIO_CRC.update(MPEG_AUDIO_CRC.init, &data[1..4])
        );

        let head = reader.crc16_update(&MPEG_AUDIO_CRC, MPEG_AUDIO_CRC.init, 8, 13)?;
        let split = reader.crc16_update(&MPEG_AUDIO_CRC, head, 21, 11)?;
        assert_eq!(split, aligned);

        assert_eq!(reader.position()?, 0);
        Ok(())
    }
}
