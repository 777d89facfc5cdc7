// Serialization helpers for the fixed-shape byte layouts
//
// Lengths in this format are always a single byte; there is no
// variable-length integer encoding.

use crate::error::{Error, Result};

/// Write bytes with a single-byte length prefix.
///
/// Fails instead of truncating when the data is longer than 255 bytes.
pub fn write_len_prefixed(buf: &mut Vec<u8>, data: &[u8], what: &str) -> Result<()> {
    let len = u8::try_from(data.len()).map_err(|_| {
        Error::Encoding(format!(
            "{} is {} bytes, longer than a single-byte length prefix allows",
            what,
            data.len()
        ))
    })?;
    buf.push(len);
    buf.extend_from_slice(data);
    Ok(())
}

/// Cursor over a byte slice that reports truncation as an encoding error
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Take the next `len` bytes
    pub fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(Error::Encoding(format!(
                "truncated {}: need {} bytes at offset {}, have {}",
                what,
                len,
                self.pos,
                self.remaining()
            ))),
        }
    }

    /// Take exactly N bytes as an array
    pub fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, what)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.read_array::<1>(what)?[0])
    }

    pub fn read_u32_le(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(what)?))
    }

    pub fn read_u64_le(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array(what)?))
    }

    /// Read a single-byte length followed by that many bytes
    pub fn read_len_prefixed(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.read_u8(what)? as usize;
        self.read_bytes(len, what)
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fail if anything is left unread
    pub fn finish(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::Encoding(format!("{} trailing bytes", self.remaining())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_prefixed() {
        let mut buf = Vec::new();
        write_len_prefixed(&mut buf, b"hello world", "data").unwrap();
        assert_eq!(buf[0], 11);

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_len_prefixed("data").unwrap(), b"hello world");
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_len_prefixed_limit() {
        let mut buf = Vec::new();
        assert!(write_len_prefixed(&mut buf, &[0u8; 255], "script").is_ok());

        let mut buf = Vec::new();
        let result = write_len_prefixed(&mut buf, &[0u8; 256], "script");
        assert!(matches!(result, Err(Error::Encoding(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_reader_integers() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x01020304u32.to_le_bytes());
        data.extend_from_slice(&1000u64.to_le_bytes());

        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u32_le("a").unwrap(), 0x01020304);
        assert_eq!(reader.read_u64_le("b").unwrap(), 1000);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_truncated() {
        let data = [5u8, 1, 2];
        let mut reader = ByteReader::new(&data);
        assert!(matches!(reader.read_len_prefixed("script"), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_reader_trailing() {
        let data = [1u8, 2];
        let mut reader = ByteReader::new(&data);
        reader.read_u8("first").unwrap();
        assert!(reader.finish().is_err());
    }
}
