//! Chunk section storage as sent since 1.18: per section a block count,
//! a block state palette container and a biome palette container.

use bytes::{Bytes, BytesMut};
use viaduct_protocol_core::codec::{read_length, read_varint, write_varint};
use viaduct_protocol_core::types::{LongArray, Short, UnsignedByte, WireType};
use viaduct_protocol_core::CodecResult;

const BLOCKS_PER_SECTION: usize = 4096;
const MAX_INDIRECT_BLOCK_BITS: u8 = 8;
const MAX_INDIRECT_BIOME_BITS: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette {
    Single(i32),
    Indirect(Vec<i32>),
    /// Values in the storage are global ids.
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedContainer {
    pub bits: u8,
    pub palette: Palette,
    pub storage: Vec<i64>,
}

impl PalettedContainer {
    fn read(buf: &mut Bytes, max_indirect_bits: u8) -> CodecResult<Self> {
        let bits = UnsignedByte.read(buf)?;
        let palette = match bits {
            0 => Palette::Single(read_varint(buf)?),
            b if b <= max_indirect_bits => {
                let len = read_length(buf)?;
                let mut entries = Vec::with_capacity(len.min(BLOCKS_PER_SECTION));
                for _ in 0..len {
                    entries.push(read_varint(buf)?);
                }
                Palette::Indirect(entries)
            }
            _ => Palette::Direct,
        };
        let storage = LongArray.read(buf)?;
        Ok(Self {
            bits,
            palette,
            storage,
        })
    }

    fn write(&self, buf: &mut BytesMut) {
        UnsignedByte.write(buf, &self.bits);
        match &self.palette {
            Palette::Single(value) => write_varint(buf, *value),
            Palette::Indirect(entries) => {
                write_varint(buf, entries.len() as i32);
                for entry in entries {
                    write_varint(buf, *entry);
                }
            }
            Palette::Direct => {}
        }
        LongArray.write(buf, &self.storage);
    }

    /// Applies `f` to every global id the container references.
    pub fn remap(&mut self, entries: usize, f: impl Fn(i32) -> i32) {
        match &mut self.palette {
            Palette::Single(value) => *value = f(*value),
            Palette::Indirect(palette) => {
                for value in palette.iter_mut() {
                    *value = f(*value);
                }
            }
            Palette::Direct => {
                let bits = self.bits as usize;
                if bits == 0 || bits > 32 {
                    return;
                }
                let per_long = 64 / bits;
                let mask = (1u64 << bits) - 1;
                for (i, long) in self.storage.iter_mut().enumerate() {
                    let mut packed = *long as u64;
                    for slot in 0..per_long {
                        if i * per_long + slot >= entries {
                            break;
                        }
                        let shift = slot * bits;
                        let value = ((packed >> shift) & mask) as i32;
                        packed &= !(mask << shift);
                        packed |= (f(value) as u64 & mask) << shift;
                    }
                    *long = packed as i64;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSection {
    pub block_count: i16,
    pub blocks: PalettedContainer,
    pub biomes: PalettedContainer,
}

impl ChunkSection {
    pub fn read(buf: &mut Bytes) -> CodecResult<Self> {
        Ok(Self {
            block_count: Short.read(buf)?,
            blocks: PalettedContainer::read(buf, MAX_INDIRECT_BLOCK_BITS)?,
            biomes: PalettedContainer::read(buf, MAX_INDIRECT_BIOME_BITS)?,
        })
    }

    pub fn write(&self, buf: &mut BytesMut) {
        Short.write(buf, &self.block_count);
        self.blocks.write(buf);
        self.biomes.write(buf);
    }

    pub fn remap_blocks(&mut self, f: impl Fn(i32) -> i32) {
        self.blocks.remap(BLOCKS_PER_SECTION, f);
    }
}

/// Reads `count` sections from the chunk data byte array.
pub fn read_sections(data: &[u8], count: usize) -> CodecResult<Vec<ChunkSection>> {
    let mut buf = Bytes::copy_from_slice(data);
    (0..count).map(|_| ChunkSection::read(&mut buf)).collect()
}

pub fn write_sections(sections: &[ChunkSection]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    for section in sections {
        section.write(&mut buf);
    }
    buf.to_vec()
}
