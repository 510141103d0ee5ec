use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// NBT tag type IDs.
pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Same limit the vanilla client applies to nested compounds and lists.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("Not enough data")]
    NotEnoughData,
    #[error("Unknown tag type {0}")]
    UnknownTag(u8),
    #[error("Negative length {0}")]
    NegativeLength(i32),
    #[error("Nesting deeper than {MAX_DEPTH}")]
    TooDeep,
}

pub type NbtResult<T> = Result<T, NbtError>;

/// An NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<(String, NbtValue)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn tag_id(&self) -> u8 {
        match self {
            NbtValue::Byte(_) => TAG_BYTE,
            NbtValue::Short(_) => TAG_SHORT,
            NbtValue::Int(_) => TAG_INT,
            NbtValue::Long(_) => TAG_LONG,
            NbtValue::Float(_) => TAG_FLOAT,
            NbtValue::Double(_) => TAG_DOUBLE,
            NbtValue::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtValue::String(_) => TAG_STRING,
            NbtValue::List(_) => TAG_LIST,
            NbtValue::Compound(_) => TAG_COMPOUND,
            NbtValue::IntArray(_) => TAG_INT_ARRAY,
            NbtValue::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Look up a key in a compound. Returns None for non-compounds.
    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        match self {
            NbtValue::Compound(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NbtValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value widened to i64 (bytes, shorts, ints and longs).
    pub fn as_long(&self) -> Option<i64> {
        match self {
            NbtValue::Byte(v) => Some(*v as i64),
            NbtValue::Short(v) => Some(*v as i64),
            NbtValue::Int(v) => Some(*v as i64),
            NbtValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[NbtValue]> {
        match self {
            NbtValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Write this value as a root tag with type byte but no name (network NBT, 1.20.2+).
    pub fn write_root_network(&self, buf: &mut BytesMut) {
        buf.put_u8(self.tag_id());
        self.write_payload(buf);
    }

    /// Write this value as a full named root tag (files and pre-1.20.2 network NBT).
    pub fn write_root_named(&self, name: &str, buf: &mut BytesMut) {
        buf.put_u8(self.tag_id());
        write_nbt_string(name, buf);
        self.write_payload(buf);
    }

    /// Write just the payload (no tag type or name).
    pub fn write_payload(&self, buf: &mut BytesMut) {
        match self {
            NbtValue::Byte(v) => buf.put_i8(*v),
            NbtValue::Short(v) => buf.put_i16(*v),
            NbtValue::Int(v) => buf.put_i32(*v),
            NbtValue::Long(v) => buf.put_i64(*v),
            NbtValue::Float(v) => buf.put_f32(*v),
            NbtValue::Double(v) => buf.put_f64(*v),
            NbtValue::ByteArray(v) => {
                buf.put_i32(v.len() as i32);
                for b in v {
                    buf.put_i8(*b);
                }
            }
            NbtValue::String(v) => {
                write_nbt_string(v, buf);
            }
            NbtValue::List(v) => {
                if v.is_empty() {
                    buf.put_u8(TAG_END);
                    buf.put_i32(0);
                } else {
                    buf.put_u8(v[0].tag_id());
                    buf.put_i32(v.len() as i32);
                    for item in v {
                        item.write_payload(buf);
                    }
                }
            }
            NbtValue::Compound(entries) => {
                for (name, value) in entries {
                    buf.put_u8(value.tag_id());
                    write_nbt_string(name, buf);
                    value.write_payload(buf);
                }
                buf.put_u8(TAG_END);
            }
            NbtValue::IntArray(v) => {
                buf.put_i32(v.len() as i32);
                for i in v {
                    buf.put_i32(*i);
                }
            }
            NbtValue::LongArray(v) => {
                buf.put_i32(v.len() as i32);
                for l in v {
                    buf.put_i64(*l);
                }
            }
        }
    }

    /// Read a named root tag. A lone `TAG_END` byte means "no value".
    pub fn read_named<B: Buf>(buf: &mut B) -> NbtResult<Option<(String, NbtValue)>> {
        let tag = read_u8(buf)?;
        if tag == TAG_END {
            return Ok(None);
        }
        let name = read_nbt_string(buf)?;
        let value = Self::read_payload(tag, buf, 0)?;
        Ok(Some((name, value)))
    }

    /// Read a nameless root tag (network NBT, 1.20.2+).
    pub fn read_nameless<B: Buf>(buf: &mut B) -> NbtResult<Option<NbtValue>> {
        let tag = read_u8(buf)?;
        if tag == TAG_END {
            return Ok(None);
        }
        Self::read_payload(tag, buf, 0).map(Some)
    }

    /// Read the payload of a tag whose type byte has already been consumed.
    pub fn read_payload<B: Buf>(tag: u8, buf: &mut B, depth: usize) -> NbtResult<NbtValue> {
        if depth > MAX_DEPTH {
            return Err(NbtError::TooDeep);
        }
        let value = match tag {
            TAG_BYTE => {
                ensure(buf, 1)?;
                NbtValue::Byte(buf.get_i8())
            }
            TAG_SHORT => {
                ensure(buf, 2)?;
                NbtValue::Short(buf.get_i16())
            }
            TAG_INT => {
                ensure(buf, 4)?;
                NbtValue::Int(buf.get_i32())
            }
            TAG_LONG => {
                ensure(buf, 8)?;
                NbtValue::Long(buf.get_i64())
            }
            TAG_FLOAT => {
                ensure(buf, 4)?;
                NbtValue::Float(buf.get_f32())
            }
            TAG_DOUBLE => {
                ensure(buf, 8)?;
                NbtValue::Double(buf.get_f64())
            }
            TAG_BYTE_ARRAY => {
                let len = read_len(buf)?;
                ensure(buf, len)?;
                NbtValue::ByteArray((0..len).map(|_| buf.get_i8()).collect())
            }
            TAG_STRING => NbtValue::String(read_nbt_string(buf)?),
            TAG_LIST => {
                let element = read_u8(buf)?;
                let len = read_len(buf)?;
                if element == TAG_END && len > 0 {
                    return Err(NbtError::UnknownTag(TAG_END));
                }
                // Each element is at least one byte; bail before allocating for bogus lengths.
                ensure(buf, len.min(buf.remaining() + 1))?;
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(Self::read_payload(element, buf, depth + 1)?);
                }
                NbtValue::List(items)
            }
            TAG_COMPOUND => {
                let mut entries = Vec::new();
                loop {
                    let child = read_u8(buf)?;
                    if child == TAG_END {
                        break;
                    }
                    let name = read_nbt_string(buf)?;
                    let value = Self::read_payload(child, buf, depth + 1)?;
                    entries.push((name, value));
                }
                NbtValue::Compound(entries)
            }
            TAG_INT_ARRAY => {
                let len = read_len(buf)?;
                ensure(buf, len.saturating_mul(4))?;
                NbtValue::IntArray((0..len).map(|_| buf.get_i32()).collect())
            }
            TAG_LONG_ARRAY => {
                let len = read_len(buf)?;
                ensure(buf, len.saturating_mul(8))?;
                NbtValue::LongArray((0..len).map(|_| buf.get_i64()).collect())
            }
            other => return Err(NbtError::UnknownTag(other)),
        };
        Ok(value)
    }
}

fn ensure<B: Buf>(buf: &B, len: usize) -> NbtResult<()> {
    if buf.remaining() < len {
        Err(NbtError::NotEnoughData)
    } else {
        Ok(())
    }
}

fn read_u8<B: Buf>(buf: &mut B) -> NbtResult<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

fn read_len<B: Buf>(buf: &mut B) -> NbtResult<usize> {
    ensure(buf, 4)?;
    let len = buf.get_i32();
    if len < 0 {
        return Err(NbtError::NegativeLength(len));
    }
    Ok(len as usize)
}

fn read_nbt_string<B: Buf>(buf: &mut B) -> NbtResult<String> {
    ensure(buf, 2)?;
    let len = buf.get_u16() as usize;
    ensure(buf, len)?;
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    // Modified UTF-8 differs only for NUL and supplementary characters.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_nbt_string(s: &str, buf: &mut BytesMut) {
    let bytes = s.as_bytes();
    buf.put_u16(bytes.len() as u16);
    buf.put_slice(bytes);
}

/// Helper macro for building compound tags.
#[macro_export]
macro_rules! nbt_compound {
    ($($key:expr => $val:expr),* $(,)?) => {
        $crate::NbtValue::Compound(vec![
            $(($key.into(), $val)),*
        ])
    };
}

/// Helper macro for building list tags.
#[macro_export]
macro_rules! nbt_list {
    ($($val:expr),* $(,)?) => {
        $crate::NbtValue::List(vec![$($val),*])
    };
}
