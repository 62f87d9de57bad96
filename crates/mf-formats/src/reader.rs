//! Cursor over a byte slice.
//!
//! All bounds checking for the decoder happens here. Offsets reported in
//! errors are absolute within the original file, including for readers
//! created with [`ByteReader::sub_reader`].

use crate::FormatError;

/// Largest value a four-byte variable-length quantity can hold.
pub const MAX_VLQ: u32 = 0x0FFF_FFFF;

/// Longest legal variable-length quantity encoding.
pub const MAX_VLQ_BYTES: usize = 4;

#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Absolute offset of `data[0]` in the file
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, base: 0 }
    }

    /// Absolute byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, n: usize) -> Result<(), FormatError> {
        if n > self.remaining() {
            return Err(FormatError::TruncatedData {
                offset: self.position(),
                needed: n,
            });
        }
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16_be(&mut self) -> Result<u16, FormatError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, FormatError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a MIDI variable-length quantity: 7 bits per byte, most
    /// significant first, continuation while the top bit is set.
    pub fn read_vlq(&mut self) -> Result<u32, FormatError> {
        let start = self.position();
        let mut value: u32 = 0;
        for _ in 0..MAX_VLQ_BYTES {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(FormatError::MalformedVlq { offset: start })
    }

    /// Split off the next `len` bytes as an independent reader and advance
    /// past them. Nothing beyond `len` is reachable through the result.
    pub fn sub_reader(&mut self, len: usize) -> Result<ByteReader<'a>, FormatError> {
        let base = self.position();
        let data = self.read_bytes(len)?;
        Ok(ByteReader { data, pos: 0, base })
    }
}

/// Encode `value` as a variable-length quantity.
///
/// Only the low 28 bits are encoded; larger values are not representable.
pub fn encode_vlq(value: u32) -> Vec<u8> {
    debug_assert!(value <= MAX_VLQ, "VLQ value {value:#x} out of range");
    let value = value & MAX_VLQ;
    let mut out = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        out.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_reads_are_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 0x12);
        assert_eq!(r.read_u16_be().unwrap(), 0x3456);
        assert_eq!(r.read_u32_be().unwrap(), 0x789A_BCDE);
        assert!(r.is_empty());
    }

    #[test]
    fn read_past_end_is_truncated() {
        let data = [0x00, 0x01, 0x02];
        let mut r = ByteReader::new(&data);
        r.skip(1).unwrap();
        assert_eq!(
            r.read_u32_be(),
            Err(FormatError::TruncatedData { offset: 1, needed: 4 })
        );
        // Failed reads leave the cursor in place
        assert_eq!(r.position(), 1);
        assert_eq!(r.read_u16_be().unwrap(), 0x0102);
        assert!(matches!(r.read_u8(), Err(FormatError::TruncatedData { offset: 3, .. })));
    }

    #[test]
    fn vlq_reference_values() {
        let cases: &[(u32, &[u8])] = &[
            (0x00, &[0x00]),
            (0x40, &[0x40]),
            (0x7F, &[0x7F]),
            (0x80, &[0x81, 0x00]),
            (0x2000, &[0xC0, 0x00]),
            (0x3FFF, &[0xFF, 0x7F]),
            (0x4000, &[0x81, 0x80, 0x00]),
            (0x10_0000, &[0xC0, 0x80, 0x00]),
            (0x1F_FFFF, &[0xFF, 0xFF, 0x7F]),
            (0x20_0000, &[0x81, 0x80, 0x80, 0x00]),
            (0x800_0000, &[0xC0, 0x80, 0x80, 0x00]),
            (MAX_VLQ, &[0xFF, 0xFF, 0xFF, 0x7F]),
        ];
        for &(value, bytes) in cases {
            assert_eq!(encode_vlq(value), bytes, "encode {value:#x}");
            let mut r = ByteReader::new(bytes);
            assert_eq!(r.read_vlq().unwrap(), value, "decode {value:#x}");
            assert!(r.is_empty());
        }
    }

    #[test]
    fn vlq_round_trip_across_range() {
        // Every encoded length boundary plus a coarse sweep of the range
        let mut values: Vec<u32> = (0..=MAX_VLQ).step_by(9_973).collect();
        for bits in [7, 14, 21, 28] {
            let edge = (1u32 << bits) - 1;
            values.extend([edge.saturating_sub(1), edge]);
            if bits < 28 {
                values.push(edge + 1);
            }
        }
        for v in values {
            let encoded = encode_vlq(v);
            assert!(encoded.len() <= MAX_VLQ_BYTES);
            let mut r = ByteReader::new(&encoded);
            assert_eq!(r.read_vlq().unwrap(), v);
        }
    }

    #[test]
    fn vlq_longer_than_four_bytes_is_malformed() {
        let data = [0x00, 0x81, 0x80, 0x80, 0x80, 0x00];
        let mut r = ByteReader::new(&data);
        r.skip(1).unwrap();
        assert_eq!(r.read_vlq(), Err(FormatError::MalformedVlq { offset: 1 }));
    }

    #[test]
    fn vlq_cut_short_is_truncated() {
        let data = [0x81, 0x80];
        let mut r = ByteReader::new(&data);
        assert_eq!(
            r.read_vlq(),
            Err(FormatError::TruncatedData { offset: 2, needed: 1 })
        );
    }

    #[test]
    fn sub_reader_bounds_region_and_keeps_offsets() {
        let data = [0xAA, 0xBB, 0x01, 0x02, 0x03, 0xCC];
        let mut r = ByteReader::new(&data);
        r.skip(2).unwrap();
        let mut sub = r.sub_reader(3).unwrap();
        assert_eq!(r.position(), 5);
        assert_eq!(sub.position(), 2);
        assert_eq!(sub.read_bytes(3).unwrap(), &[0x01, 0x02, 0x03]);
        assert_eq!(
            sub.read_u8(),
            Err(FormatError::TruncatedData { offset: 5, needed: 1 })
        );
    }

    #[test]
    fn sub_reader_longer_than_buffer_is_truncated() {
        let data = [0u8; 4];
        let mut r = ByteReader::new(&data);
        assert_eq!(
            r.sub_reader(10).unwrap_err(),
            FormatError::TruncatedData { offset: 0, needed: 10 }
        );
    }
}
