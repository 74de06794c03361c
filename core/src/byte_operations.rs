//! Bounds-checked little-endian reads over a byte slice.
//!
//! Every asset format in the engine is parsed leniently: a read that would run
//! past the end of the buffer returns `None` and leaves the cursor where it was,
//! so callers can stop early and keep whatever they already decoded.

#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns true when at least `count` more bytes can be read.
    #[inline]
    pub fn has(&self, count: usize) -> bool {
        self.remaining() >= count
    }

    /// Moves the cursor to an absolute offset, clamped to the end of the buffer.
    pub fn seek(&mut self, offset: usize) {
        self.offset = offset.min(self.bytes.len());
    }

    pub fn skip(&mut self, count: usize) -> Option<()> {
        self.read_bytes(count).map(|_| ())
    }

    pub fn read_bytes(&mut self, count: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(count)?;
        let slice = self.bytes.get(self.offset..end)?;
        self.offset = end;
        Some(slice)
    }

    pub fn read_tag<const N: usize>(&mut self) -> Option<[u8; N]> {
        let slice = self.read_bytes(N)?;
        let mut tag = [0u8; N];
        tag.copy_from_slice(slice);
        Some(tag)
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_tag::<1>().map(|b| b[0])
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        self.read_tag::<2>().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        self.read_tag::<4>().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_tag::<4>().map(i32::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Option<f32> {
        self.read_tag::<4>().map(f32::from_le_bytes)
    }

    /// Reads a `u32` without advancing.
    pub fn peek_u32(&self) -> Option<u32> {
        self.clone().read_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::ByteReader;

    #[test]
    fn test_read_u8() {
        let bytes = [42u8, 100, 200];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(reader.read_u8(), Some(42));
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.read_u8(), Some(100));
        assert_eq!(reader.read_u8(), Some(200));
        assert_eq!(reader.read_u8(), None);
        assert_eq!(reader.position(), 3);
    }

    #[test]
    fn test_read_u16() {
        // Little endian: 0x0201
        let bytes = [0x01, 0x02, 0xFF, 0xFF];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(reader.read_u16(), Some(0x0201));
        assert_eq!(reader.read_u16(), Some(0xFFFF));
        assert_eq!(reader.read_u16(), None);
    }

    #[test]
    fn test_read_u32_and_i32() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(reader.read_u32(), Some(0x04030201));
        assert_eq!(reader.read_i32(), Some(-1));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_f32() {
        let bytes = 1.5f32.to_le_bytes();
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_f32(), Some(1.5));
    }

    #[test]
    fn failed_read_does_not_advance() {
        let bytes = [0x01, 0x02, 0x03];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(reader.read_u8(), Some(1));
        assert_eq!(reader.read_u32(), None);
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.read_u16(), Some(0x0302));
    }

    #[test]
    fn read_bytes_rejects_overflowing_counts() {
        let bytes = [0u8; 4];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_bytes(usize::MAX), None);
        assert_eq!(reader.read_bytes(5), None);
        assert_eq!(reader.read_bytes(4), Some(&bytes[..]));
    }

    #[test]
    fn peek_and_seek() {
        let bytes = [0x10, 0, 0, 0, 0x20, 0, 0, 0];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(reader.peek_u32(), Some(0x10));
        assert_eq!(reader.position(), 0);
        reader.seek(4);
        assert_eq!(reader.read_u32(), Some(0x20));
        reader.seek(100);
        assert_eq!(reader.position(), 8);
        assert_eq!(reader.skip(1), None);
    }

    #[test]
    fn test_mixed_reads() {
        let bytes = [
            0x42, // u8: 66
            0x34, 0x12, // u16: 0x1234
            0x78, 0x56, 0x34, 0x12, // u32: 0x12345678
            b'B', b'L', b'K', // tag
        ];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(reader.read_u8(), Some(66));
        assert_eq!(reader.read_u16(), Some(0x1234));
        assert_eq!(reader.read_u32(), Some(0x12345678));
        assert_eq!(reader.read_tag::<3>(), Some(*b"BLK"));
        assert_eq!(reader.remaining(), 0);
    }
}
