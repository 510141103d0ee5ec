use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use uuid::Uuid;
use viaduct_nbt::NbtError;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("VarInt too big")]
    VarIntTooBig,
    #[error("Not enough data")]
    NotEnoughData,
    #[error("String too long: {0} > {1}")]
    StringTooLong(usize, usize),
    #[error("Invalid {what} discriminant {value}")]
    InvalidDiscriminant { what: &'static str, value: i32 },
    #[error("NBT error: {0}")]
    Nbt(#[from] NbtError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Vanilla limit for most protocol strings.
pub const MAX_STRING_LEN: usize = 32767;

pub(crate) fn ensure<B: Buf>(buf: &B, len: usize) -> CodecResult<()> {
    if buf.remaining() < len {
        Err(CodecError::NotEnoughData)
    } else {
        Ok(())
    }
}

/// Read a VarInt from the buffer.
pub fn read_varint<B: Buf>(buf: &mut B) -> CodecResult<i32> {
    let mut result: i32 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 35 {
            return Err(CodecError::VarIntTooBig);
        }
    }
}

/// Write a VarInt to the buffer.
pub fn write_varint(buf: &mut BytesMut, mut value: i32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u32) >> 7) as i32;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Calculate the byte length of a VarInt.
pub fn varint_len(value: i32) -> usize {
    let mut val = value as u32;
    let mut len = 0;
    loop {
        len += 1;
        val >>= 7;
        if val == 0 {
            break;
        }
    }
    len
}

/// Read a VarLong from the buffer.
pub fn read_varlong<B: Buf>(buf: &mut B) -> CodecResult<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 70 {
            return Err(CodecError::VarIntTooBig);
        }
    }
}

pub fn write_varlong(buf: &mut BytesMut, mut value: i64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u64) >> 7) as i64;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Read a length prefix, rejecting negative values.
pub fn read_length<B: Buf>(buf: &mut B) -> CodecResult<usize> {
    let len = read_varint(buf)?;
    usize::try_from(len).map_err(|_| CodecError::InvalidDiscriminant {
        what: "length",
        value: len,
    })
}

/// Read a protocol string (varint-prefixed UTF-8).
pub fn read_string<B: Buf>(buf: &mut B, max_len: usize) -> CodecResult<String> {
    let len = read_length(buf)?;
    if len > max_len * 4 {
        return Err(CodecError::StringTooLong(len, max_len));
    }
    ensure(buf, len)?;
    let bytes = buf.copy_to_bytes(len);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write a protocol string.
pub fn write_string(buf: &mut BytesMut, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.put_slice(s.as_bytes());
}

/// Read a UUID (128 bits, big endian).
pub fn read_uuid<B: Buf>(buf: &mut B) -> CodecResult<Uuid> {
    ensure(buf, 16)?;
    let mut bytes = [0u8; 16];
    buf.copy_to_slice(&mut bytes);
    Ok(Uuid::from_bytes(bytes))
}

/// Write a UUID.
pub fn write_uuid(buf: &mut BytesMut, uuid: &Uuid) {
    buf.put_slice(uuid.as_bytes());
}

/// Read a byte array with varint length prefix.
pub fn read_byte_array<B: Buf>(buf: &mut B) -> CodecResult<Vec<u8>> {
    let len = read_length(buf)?;
    ensure(buf, len)?;
    Ok(buf.copy_to_bytes(len).to_vec())
}

/// Write a byte array with varint length prefix.
pub fn write_byte_array(buf: &mut BytesMut, data: &[u8]) {
    write_varint(buf, data.len() as i32);
    buf.put_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_varint_roundtrip() {
        let test_cases = vec![
            (0, vec![0x00]),
            (1, vec![0x01]),
            (127, vec![0x7F]),
            (128, vec![0x80, 0x01]),
            (255, vec![0xFF, 0x01]),
            (25565, vec![0xDD, 0xC7, 0x01]),
            (2097151, vec![0xFF, 0xFF, 0x7F]),
            (-1, vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
        ];

        for (value, expected_bytes) in test_cases {
            let mut buf = BytesMut::new();
            write_varint(&mut buf, value);
            assert_eq!(buf.to_vec(), expected_bytes, "write_varint({}) failed", value);

            let mut buf = Bytes::from(expected_bytes);
            let result = read_varint(&mut buf).unwrap();
            assert_eq!(result, value, "read_varint for {} failed", value);
        }
    }

    #[test]
    fn test_varint_len() {
        assert_eq!(varint_len(0), 1);
        assert_eq!(varint_len(127), 1);
        assert_eq!(varint_len(128), 2);
        assert_eq!(varint_len(25565), 3);
        assert_eq!(varint_len(-1), 5);
    }

    #[test]
    fn test_varint_too_long() {
        let mut buf = Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        assert!(matches!(read_varint(&mut buf), Err(CodecError::VarIntTooBig)));
    }

    #[test]
    fn test_truncated_reads() {
        let mut buf = Bytes::from_static(&[0x80]);
        assert!(matches!(read_varint(&mut buf), Err(CodecError::NotEnoughData)));

        let mut buf = Bytes::from_static(&[0x05, b'a', b'b']);
        assert!(matches!(read_string(&mut buf, 16), Err(CodecError::NotEnoughData)));

        let mut buf = Bytes::from_static(&[0x01, 0x02]);
        assert!(matches!(read_uuid(&mut buf), Err(CodecError::NotEnoughData)));
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, -3);
        let mut buf = buf.freeze();
        assert!(matches!(
            read_byte_array(&mut buf),
            Err(CodecError::InvalidDiscriminant { .. })
        ));
    }

    #[test]
    fn test_varlong_negative() {
        let mut buf = BytesMut::new();
        write_varlong(&mut buf, -2);
        assert_eq!(buf.len(), 10);
        assert_eq!(read_varlong(&mut buf.freeze()).unwrap(), -2);
    }

    #[test]
    fn test_string_roundtrip() {
        let test_str = "Hello, Minecraft!";
        let mut buf = BytesMut::new();
        write_string(&mut buf, test_str);
        let result = read_string(&mut buf, MAX_STRING_LEN).unwrap();
        assert_eq!(result, test_str);
    }
}
