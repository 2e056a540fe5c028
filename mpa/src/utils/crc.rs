//! CRC-16 used to protect MPEG audio frame headers.
//!
//! The checksum covers the last 16 bits of the frame header and a
//! layer-dependent number of bits following the CRC word, so it has to be
//! computable over bit ranges that do not end on a byte boundary.

/// CRC algorithm specification with polynomial and initial value.
pub struct Algorithm<T> {
    poly: T,
    init: T,
}

/// CRC-16 of ISO/IEC 11172-3, section 2.4.3.1.
pub const CRC_MPEG_AUDIO_ALG: Algorithm<u16> = Algorithm {
    poly: 0x8005,
    init: 0xFFFF,
};

/// Feeds the `len` low bits of `bits` into `value`, most significant bit first.
#[inline(always)]
pub const fn crc16(poly: u16, mut value: u16, bits: u32, len: u32) -> u16 {
    let mut i = len;
    while i > 0 {
        i -= 1;
        let bit = ((bits >> i) & 1) as u16;
        let msb = (value >> 15) & 1;
        value <<= 1;
        value ^= (msb ^ bit) * poly;
    }

    value
}

#[inline(always)]
const fn crc16_table(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = crc16(poly, (i as u16) << 8, 0, 8);
        i += 1;
    }

    table
}

#[derive(Debug)]
pub struct Crc16 {
    pub poly: u16,
    pub init: u16,
    table: [u16; 256],
}

impl Crc16 {
    pub const fn new(algorithm: &Algorithm<u16>) -> Self {
        Self {
            poly: algorithm.poly,
            init: algorithm.init,
            table: crc16_table(algorithm.poly),
        }
    }

    const fn table_entry(&self, index: u16) -> u16 {
        self.table[(index & 0xFF) as usize]
    }

    #[inline(always)]
    pub const fn update(&self, mut crc: u16, bytes: &[u8]) -> u16 {
        let mut i = 0;

        while i < bytes.len() {
            crc = self.table_entry((crc >> 8) ^ bytes[i] as u16) ^ (crc << 8);
            i += 1;
        }

        crc
    }

    /// Feeds a partial byte of `len` bits (right aligned in `bits`).
    #[inline(always)]
    pub const fn update_bits(&self, crc: u16, bits: u32, len: u32) -> u16 {
        crc16(self.poly, crc, bits, len)
    }
}

/// Shared instance for frame CRC checks.
pub static MPEG_AUDIO_CRC: Crc16 = Crc16::new(&CRC_MPEG_AUDIO_ALG);
