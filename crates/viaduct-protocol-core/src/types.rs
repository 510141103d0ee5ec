//! Typed wire values read from and written to packet buffers.

use crate::codec::*;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use uuid::Uuid;
use viaduct_nbt::NbtValue;
use viaduct_types::{BlockPos, GlobalPosition};

/// A wire encoding with a decoded value type.
pub trait WireType {
    type Value;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Self::Value>;
    fn write(&self, buf: &mut BytesMut, value: &Self::Value);
}

impl<T: WireType + ?Sized> WireType for &T {
    type Value = T::Value;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Self::Value> {
        (**self).read(buf)
    }

    fn write(&self, buf: &mut BytesMut, value: &Self::Value) {
        (**self).write(buf, value)
    }
}

macro_rules! fixed_width {
    ($name:ident, $value:ty, $len:expr, $get:ident, $put:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl WireType for $name {
            type Value = $value;

            fn read(&self, buf: &mut Bytes) -> CodecResult<$value> {
                ensure(buf, $len)?;
                Ok(buf.$get())
            }

            fn write(&self, buf: &mut BytesMut, value: &$value) {
                buf.$put(*value);
            }
        }
    };
}

fixed_width!(Byte, i8, 1, get_i8, put_i8);
fixed_width!(UnsignedByte, u8, 1, get_u8, put_u8);
fixed_width!(Short, i16, 2, get_i16, put_i16);
fixed_width!(UnsignedShort, u16, 2, get_u16, put_u16);
fixed_width!(Int, i32, 4, get_i32, put_i32);
fixed_width!(Long, i64, 8, get_i64, put_i64);
fixed_width!(Float, f32, 4, get_f32, put_f32);
fixed_width!(Double, f64, 8, get_f64, put_f64);

#[derive(Debug, Clone, Copy)]
pub struct Bool;

impl WireType for Bool {
    type Value = bool;

    fn read(&self, buf: &mut Bytes) -> CodecResult<bool> {
        ensure(buf, 1)?;
        Ok(buf.get_u8() != 0)
    }

    fn write(&self, buf: &mut BytesMut, value: &bool) {
        buf.put_u8(*value as u8);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VarInt;

impl WireType for VarInt {
    type Value = i32;

    fn read(&self, buf: &mut Bytes) -> CodecResult<i32> {
        read_varint(buf)
    }

    fn write(&self, buf: &mut BytesMut, value: &i32) {
        write_varint(buf, *value);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VarLong;

impl WireType for VarLong {
    type Value = i64;

    fn read(&self, buf: &mut Bytes) -> CodecResult<i64> {
        read_varlong(buf)
    }

    fn write(&self, buf: &mut BytesMut, value: &i64) {
        write_varlong(buf, *value);
    }
}

/// Varint-prefixed UTF-8 string.
#[derive(Debug, Clone, Copy)]
pub struct Str;

impl WireType for Str {
    type Value = String;

    fn read(&self, buf: &mut Bytes) -> CodecResult<String> {
        read_string(buf, MAX_STRING_LEN)
    }

    fn write(&self, buf: &mut BytesMut, value: &String) {
        write_string(buf, value);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StrArray;

impl WireType for StrArray {
    type Value = Vec<String>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Vec<String>> {
        let len = read_length(buf)?;
        let mut out = Vec::with_capacity(len.min(buf.remaining()));
        for _ in 0..len {
            out.push(read_string(buf, MAX_STRING_LEN)?);
        }
        Ok(out)
    }

    fn write(&self, buf: &mut BytesMut, value: &Vec<String>) {
        write_varint(buf, value.len() as i32);
        for s in value {
            write_string(buf, s);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UuidType;

impl WireType for UuidType {
    type Value = Uuid;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Uuid> {
        read_uuid(buf)
    }

    fn write(&self, buf: &mut BytesMut, value: &Uuid) {
        write_uuid(buf, value);
    }
}

/// Packed block position, 1.14+ bit layout.
#[derive(Debug, Clone, Copy)]
pub struct Position;

impl WireType for Position {
    type Value = BlockPos;

    fn read(&self, buf: &mut Bytes) -> CodecResult<BlockPos> {
        ensure(buf, 8)?;
        Ok(BlockPos::decode(buf.get_u64()))
    }

    fn write(&self, buf: &mut BytesMut, value: &BlockPos) {
        buf.put_u64(value.encode());
    }
}

/// Packed block position, pre-1.14 bit layout.
#[derive(Debug, Clone, Copy)]
pub struct LegacyPosition;

impl WireType for LegacyPosition {
    type Value = BlockPos;

    fn read(&self, buf: &mut Bytes) -> CodecResult<BlockPos> {
        ensure(buf, 8)?;
        Ok(BlockPos::decode_legacy(buf.get_u64()))
    }

    fn write(&self, buf: &mut BytesMut, value: &BlockPos) {
        buf.put_u64(value.encode_legacy());
    }
}

/// Boolean-prefixed dimension name and position (death location).
#[derive(Debug, Clone, Copy)]
pub struct OptGlobalPosition;

impl WireType for OptGlobalPosition {
    type Value = Option<GlobalPosition>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Self::Value> {
        if !Bool.read(buf)? {
            return Ok(None);
        }
        let dimension = read_string(buf, MAX_STRING_LEN)?;
        let pos = Position.read(buf)?;
        Ok(Some(GlobalPosition { dimension, pos }))
    }

    fn write(&self, buf: &mut BytesMut, value: &Self::Value) {
        match value {
            None => buf.put_u8(0),
            Some(global) => {
                buf.put_u8(1);
                write_string(buf, &global.dimension);
                Position.write(buf, &global.pos);
            }
        }
    }
}

/// Varint-prefixed byte array.
#[derive(Debug, Clone, Copy)]
pub struct ByteArray;

impl WireType for ByteArray {
    type Value = Vec<u8>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Vec<u8>> {
        read_byte_array(buf)
    }

    fn write(&self, buf: &mut BytesMut, value: &Vec<u8>) {
        write_byte_array(buf, value);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VarIntArray;

impl WireType for VarIntArray {
    type Value = Vec<i32>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Vec<i32>> {
        let len = read_length(buf)?;
        let mut out = Vec::with_capacity(len.min(buf.remaining()));
        for _ in 0..len {
            out.push(read_varint(buf)?);
        }
        Ok(out)
    }

    fn write(&self, buf: &mut BytesMut, value: &Vec<i32>) {
        write_varint(buf, value.len() as i32);
        for v in value {
            write_varint(buf, *v);
        }
    }
}

/// Varint count followed by big-endian longs (chunk bit storage).
#[derive(Debug, Clone, Copy)]
pub struct LongArray;

impl WireType for LongArray {
    type Value = Vec<i64>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Vec<i64>> {
        let len = read_length(buf)?;
        ensure(buf, len.saturating_mul(8))?;
        Ok((0..len).map(|_| buf.get_i64()).collect())
    }

    fn write(&self, buf: &mut BytesMut, value: &Vec<i64>) {
        write_varint(buf, value.len() as i32);
        for v in value {
            buf.put_i64(*v);
        }
    }
}

/// Root NBT tag with a name, as sent before 1.20.2. The name is discarded.
#[derive(Debug, Clone, Copy)]
pub struct NamedNbt;

impl WireType for NamedNbt {
    type Value = Option<NbtValue>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Self::Value> {
        Ok(NbtValue::read_named(buf)?.map(|(_, value)| value))
    }

    fn write(&self, buf: &mut BytesMut, value: &Self::Value) {
        match value {
            Some(value) => value.write_root_named("", buf),
            None => buf.put_u8(viaduct_nbt::TAG_END),
        }
    }
}

/// Root NBT tag without a name (1.20.2+).
#[derive(Debug, Clone, Copy)]
pub struct NamelessNbt;

impl WireType for NamelessNbt {
    type Value = Option<NbtValue>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Self::Value> {
        Ok(NbtValue::read_nameless(buf)?)
    }

    fn write(&self, buf: &mut BytesMut, value: &Self::Value) {
        match value {
            Some(value) => value.write_root_network(buf),
            None => buf.put_u8(viaduct_nbt::TAG_END),
        }
    }
}

/// An item stack. `damage` is only carried on the wire by the 1.8 format.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: i32,
    pub count: i8,
    pub damage: i16,
    pub tag: Option<NbtValue>,
}

impl Item {
    pub fn new(id: i32, count: i8) -> Self {
        Self {
            id,
            count,
            damage: 0,
            tag: None,
        }
    }
}

/// 1.8 - 1.12 slot: short id (`-1` empty), count, damage, named NBT.
#[derive(Debug, Clone, Copy)]
pub struct LegacyItemType;

impl WireType for LegacyItemType {
    type Value = Option<Item>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Self::Value> {
        let id = Short.read(buf)?;
        if id < 0 {
            return Ok(None);
        }
        let count = Byte.read(buf)?;
        let damage = Short.read(buf)?;
        let tag = NamedNbt.read(buf)?;
        Ok(Some(Item {
            id: id as i32,
            count,
            damage,
            tag,
        }))
    }

    fn write(&self, buf: &mut BytesMut, value: &Self::Value) {
        match value {
            None => buf.put_i16(-1),
            Some(item) => {
                buf.put_i16(item.id as i16);
                buf.put_i8(item.count);
                buf.put_i16(item.damage);
                NamedNbt.write(buf, &item.tag);
            }
        }
    }
}

/// 1.13 - 1.20.4 slot: present flag, varint id, count, then NBT in the given root form.
#[derive(Debug, Clone, Copy)]
pub struct ItemType {
    pub nameless_nbt: bool,
}

impl ItemType {
    pub const NAMED: ItemType = ItemType { nameless_nbt: false };
    pub const NAMELESS: ItemType = ItemType { nameless_nbt: true };
}

impl WireType for ItemType {
    type Value = Option<Item>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Self::Value> {
        if !Bool.read(buf)? {
            return Ok(None);
        }
        let id = read_varint(buf)?;
        let count = Byte.read(buf)?;
        let tag = if self.nameless_nbt {
            NamelessNbt.read(buf)?
        } else {
            NamedNbt.read(buf)?
        };
        Ok(Some(Item {
            id,
            count,
            damage: 0,
            tag,
        }))
    }

    fn write(&self, buf: &mut BytesMut, value: &Self::Value) {
        match value {
            None => buf.put_u8(0),
            Some(item) => {
                buf.put_u8(1);
                write_varint(buf, item.id);
                buf.put_i8(item.count);
                if self.nameless_nbt {
                    NamelessNbt.write(buf, &item.tag);
                } else {
                    NamedNbt.write(buf, &item.tag);
                }
            }
        }
    }
}
