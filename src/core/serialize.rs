// Binary encoding for ledger data structures
//
// Fixed-width integers are big-endian; collection lengths use a
// CompactSize varint. Encoding is deterministic: the same value always
// produces the same bytes.

use crate::error::{LedgerError, Result};
use std::io::{self, Cursor, Read};

/// Trait for types stored on disk and fed to the hash functions
pub trait Serializable: Sized {
    /// Append the encoding of `self` to `buf`
    fn encode(&self, buf: &mut Vec<u8>);

    /// Read one value from `reader`
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self>;

    fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }

    /// Decode a complete record, rejecting trailing bytes
    fn deserialize(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let value = Self::decode(&mut cursor)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        if cursor.position() != data.len() as u64 {
            return Err(LedgerError::Serialization(format!(
                "{} trailing bytes after record",
                data.len() as u64 - cursor.position()
            )));
        }
        Ok(value)
    }
}

/// Write a variable-length integer (CompactSize)
pub fn write_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => buf.push(value as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x10000..=0xffffffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Read a variable-length integer (CompactSize)
pub fn read_varint<R: Read + ?Sized>(reader: &mut R) -> io::Result<u64> {
    let mut first_byte = [0u8; 1];
    reader.read_exact(&mut first_byte)?;

    let (value, min) = match first_byte[0] {
        0..=0xfc => return Ok(first_byte[0] as u64),
        0xfd => (u16::from_le_bytes(read_array(reader)?) as u64, 0xfd),
        0xfe => (u32::from_le_bytes(read_array(reader)?) as u64, 0x1_0000),
        0xff => (u64::from_le_bytes(read_array(reader)?), 0x1_0000_0000),
    };

    // Only the shortest encoding is accepted
    if value < min {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("non-canonical varint: {} with prefix {:#04x}", value, first_byte[0]),
        ));
    }
    Ok(value)
}

/// Write bytes with length prefix (VarInt length + data)
pub fn write_var_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_varint(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

/// Read bytes with length prefix
pub fn read_var_bytes<R: Read + ?Sized>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_varint(reader)?;
    let mut data = Vec::new();
    // Bounded read: a corrupted length must not trigger a huge allocation
    (&mut *reader).take(len).read_to_end(&mut data)?;
    if data.len() as u64 != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, got {}", len, data.len()),
        ));
    }
    Ok(data)
}

pub fn read_array<const N: usize, R: Read + ?Sized>(reader: &mut R) -> io::Result<[u8; N]> {
    let mut bytes = [0u8; N];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}
