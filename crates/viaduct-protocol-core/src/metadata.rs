//! Entity metadata: the wire codec for metadata lists and the per version
//! pair index table that says where each field goes.

use crate::codec::*;
use crate::entity::{EntityTypeId, EntityTypeRegistry};
use crate::error::RegistryError;
use crate::types::{
    Bool, Float, Int, Item, ItemType, LegacyItemType, LegacyPosition, NamedNbt, NamelessNbt,
    OptGlobalPosition, Position, UuidType, WireType,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use viaduct_data::MappingData;
use viaduct_nbt::NbtValue;
use viaduct_types::{BlockPos, GlobalPosition};

/// How a metadata value is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    Byte,
    Short,
    Int,
    VarInt,
    VarLong,
    Float,
    String,
    /// JSON text component.
    Component,
    OptComponent,
    /// 1.8 slot with a short item id.
    LegacyItem,
    /// Slot with named root NBT.
    Item,
    /// Slot with nameless root NBT.
    NamelessItem,
    Boolean,
    /// Three floats (1.8 rotation, armor stand poses).
    Rotation,
    Vector3f,
    Quaternion,
    /// Three ints (1.8).
    IntPosition,
    LegacyPosition,
    OptLegacyPosition,
    Position,
    OptPosition,
    OptUuid,
    BlockState,
    OptBlockState,
    Nbt,
    NamelessNbt,
    Particle,
    VillagerData,
    OptVarInt,
    OptGlobalPosition,
}

impl MetaKind {
    /// The encoding this kind is written as in the next protocol version
    /// when no index table says otherwise.
    pub fn successor(self) -> MetaKind {
        match self {
            MetaKind::Short | MetaKind::Int => MetaKind::VarInt,
            MetaKind::IntPosition => MetaKind::LegacyPosition,
            MetaKind::Rotation => MetaKind::Vector3f,
            MetaKind::Item => MetaKind::NamelessItem,
            MetaKind::Nbt => MetaKind::NamelessNbt,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    VarInt(i32),
    VarLong(i64),
    Float(f32),
    String(String),
    OptString(Option<String>),
    Item(Option<Item>),
    Boolean(bool),
    Vector3f([f32; 3]),
    Quaternion([f32; 4]),
    Position(BlockPos),
    OptPosition(Option<BlockPos>),
    OptUuid(Option<Uuid>),
    BlockState(i32),
    Nbt(Option<NbtValue>),
    Particle(Particle),
    VillagerData([i32; 3]),
    OptVarInt(Option<i32>),
    OptGlobalPosition(Option<GlobalPosition>),
}

impl MetaValue {
    /// Converts a value read as `from` into one writable as `to`.
    pub fn coerce(self, from: MetaKind, to: MetaKind) -> Option<MetaValue> {
        use MetaKind as K;
        if from == to {
            return Some(self);
        }
        match (from, to, self) {
            (K::Byte, K::Boolean, MetaValue::Byte(v)) => Some(MetaValue::Boolean(v != 0)),
            (K::Boolean, K::Byte, MetaValue::Boolean(v)) => Some(MetaValue::Byte(v as i8)),
            (K::Byte, K::VarInt, MetaValue::Byte(v)) => Some(MetaValue::VarInt(v as i32)),
            (K::Short, K::VarInt, MetaValue::Short(v)) => Some(MetaValue::VarInt(v as i32)),
            (K::Int, K::VarInt, MetaValue::Int(v)) => Some(MetaValue::VarInt(v)),
            (K::Short, K::Byte, MetaValue::Short(v)) => Some(MetaValue::Byte(v as i8)),
            (K::Int, K::Byte, MetaValue::Int(v)) => Some(MetaValue::Byte(v as i8)),
            (K::Rotation, K::Vector3f, v @ MetaValue::Vector3f(_)) => Some(v),
            (K::IntPosition, K::LegacyPosition | K::Position, v @ MetaValue::Position(_)) => {
                Some(v)
            }
            (K::OptLegacyPosition, K::OptPosition, v @ MetaValue::OptPosition(_)) => Some(v),
            (K::BlockState | K::OptBlockState, K::BlockState | K::OptBlockState, v) => Some(v),
            (K::String, K::Component, v @ MetaValue::String(_)) => Some(v),
            // Unowned is an empty string.
            (K::String, K::OptUuid, MetaValue::String(s)) => {
                Some(MetaValue::OptUuid(Uuid::parse_str(&s).ok()))
            }
            (
                K::LegacyItem | K::Item | K::NamelessItem,
                K::LegacyItem | K::Item | K::NamelessItem,
                v,
            ) => Some(v),
            (K::Nbt | K::NamelessNbt, K::Nbt | K::NamelessNbt, v) => Some(v),
            _ => None,
        }
    }
}

/// One entry of a metadata list.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub index: u8,
    pub type_id: i32,
    pub value: MetaValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: i32,
    pub data: Vec<ParticleData>,
}

/// One field of a particle's extra data, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleData {
    BlockState(i32),
    VarInt(i32),
    Float(f32),
    Item(Option<Item>),
    Position(BlockPos),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParticleLayout {
    None,
    BlockState,
    Dust,
    DustTransition,
    Item,
    Vibration,
    Float,
    VarInt,
}

/// Extra-data layouts of a version's particle registry, built from its identifiers.
#[derive(Debug, Clone)]
pub struct ParticleRegistry {
    layouts: Vec<ParticleLayout>,
}

impl ParticleRegistry {
    pub fn from_identifiers(identifiers: &[String]) -> Self {
        let layouts = identifiers
            .iter()
            .map(|id| match id.strip_prefix("minecraft:").unwrap_or(id) {
                "block" | "block_marker" | "falling_dust" => ParticleLayout::BlockState,
                "dust" => ParticleLayout::Dust,
                "dust_color_transition" => ParticleLayout::DustTransition,
                "item" => ParticleLayout::Item,
                "vibration" => ParticleLayout::Vibration,
                "sculk_charge" => ParticleLayout::Float,
                "shriek" => ParticleLayout::VarInt,
                _ => ParticleLayout::None,
            })
            .collect();
        Self { layouts }
    }

    fn read(&self, buf: &mut Bytes, items: ItemType) -> CodecResult<Particle> {
        let id = read_varint(buf)?;
        let layout = usize::try_from(id)
            .ok()
            .and_then(|i| self.layouts.get(i))
            .copied()
            .ok_or(CodecError::InvalidDiscriminant {
                what: "particle",
                value: id,
            })?;
        let mut data = Vec::new();
        match layout {
            ParticleLayout::None => {}
            ParticleLayout::BlockState => data.push(ParticleData::BlockState(read_varint(buf)?)),
            ParticleLayout::Dust => {
                for _ in 0..4 {
                    data.push(ParticleData::Float(Float.read(buf)?));
                }
            }
            ParticleLayout::DustTransition => {
                for _ in 0..7 {
                    data.push(ParticleData::Float(Float.read(buf)?));
                }
            }
            ParticleLayout::Item => data.push(ParticleData::Item(items.read(buf)?)),
            ParticleLayout::Vibration => {
                let source = read_varint(buf)?;
                data.push(ParticleData::VarInt(source));
                match source {
                    0 => data.push(ParticleData::Position(Position.read(buf)?)),
                    1 => {
                        data.push(ParticleData::VarInt(read_varint(buf)?));
                        data.push(ParticleData::Float(Float.read(buf)?));
                    }
                    other => {
                        return Err(CodecError::InvalidDiscriminant {
                            what: "position source",
                            value: other,
                        })
                    }
                }
                data.push(ParticleData::VarInt(read_varint(buf)?));
            }
            ParticleLayout::Float => data.push(ParticleData::Float(Float.read(buf)?)),
            ParticleLayout::VarInt => data.push(ParticleData::VarInt(read_varint(buf)?)),
        }
        Ok(Particle { id, data })
    }
}

fn write_particle(buf: &mut BytesMut, particle: &Particle, items: ItemType) {
    write_varint(buf, particle.id);
    for field in &particle.data {
        match field {
            ParticleData::BlockState(v) | ParticleData::VarInt(v) => write_varint(buf, *v),
            ParticleData::Float(v) => buf.put_f32(*v),
            ParticleData::Item(item) => items.write(buf, item),
            ParticleData::Position(pos) => Position.write(buf, pos),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFraming {
    /// 1.8: header byte `type << 5 | index`, terminated by `0x7F`.
    Legacy,
    /// 1.9+: index byte, varint type, terminated by `0xFF`.
    Modern,
}

/// A version's metadata list encoding: framing plus the type id table.
#[derive(Debug, Clone)]
pub struct MetadataListType {
    framing: MetadataFraming,
    kinds: Vec<MetaKind>,
    particles: Option<Arc<ParticleRegistry>>,
}

impl MetadataListType {
    pub fn new(framing: MetadataFraming, kinds: Vec<MetaKind>) -> Self {
        Self {
            framing,
            kinds,
            particles: None,
        }
    }

    pub fn with_particles(mut self, particles: Arc<ParticleRegistry>) -> Self {
        self.particles = Some(particles);
        self
    }

    pub fn kind(&self, type_id: i32) -> Option<MetaKind> {
        usize::try_from(type_id)
            .ok()
            .and_then(|i| self.kinds.get(i))
            .copied()
    }

    pub fn type_id(&self, kind: MetaKind) -> Option<i32> {
        self.kinds.iter().position(|k| *k == kind).map(|i| i as i32)
    }

    /// Where an entry of `old` lands in this list when no index table applies.
    /// Keeps the type id when it still has the expected encoding.
    pub fn map_type_from(&self, old: &MetadataListType, type_id: i32) -> Option<(i32, MetaKind)> {
        let target = old.kind(type_id)?.successor();
        if self.kind(type_id) == Some(target) {
            return Some((type_id, target));
        }
        self.type_id(target).map(|id| (id, target))
    }

    fn item_type(&self) -> ItemType {
        if self.kinds.contains(&MetaKind::NamelessItem) {
            ItemType::NAMELESS
        } else {
            ItemType::NAMED
        }
    }

    fn read_value(&self, kind: MetaKind, buf: &mut Bytes) -> CodecResult<MetaValue> {
        Ok(match kind {
            MetaKind::Byte => {
                ensure(buf, 1)?;
                MetaValue::Byte(buf.get_i8())
            }
            MetaKind::Short => {
                ensure(buf, 2)?;
                MetaValue::Short(buf.get_i16())
            }
            MetaKind::Int => MetaValue::Int(Int.read(buf)?),
            MetaKind::VarInt => MetaValue::VarInt(read_varint(buf)?),
            MetaKind::VarLong => MetaValue::VarLong(read_varlong(buf)?),
            MetaKind::Float => MetaValue::Float(Float.read(buf)?),
            MetaKind::String | MetaKind::Component => {
                MetaValue::String(read_string(buf, MAX_STRING_LEN)?)
            }
            MetaKind::OptComponent => MetaValue::OptString(if Bool.read(buf)? {
                Some(read_string(buf, MAX_STRING_LEN)?)
            } else {
                None
            }),
            MetaKind::LegacyItem => MetaValue::Item(LegacyItemType.read(buf)?),
            MetaKind::Item => MetaValue::Item(ItemType::NAMED.read(buf)?),
            MetaKind::NamelessItem => MetaValue::Item(ItemType::NAMELESS.read(buf)?),
            MetaKind::Boolean => MetaValue::Boolean(Bool.read(buf)?),
            MetaKind::Rotation | MetaKind::Vector3f => {
                ensure(buf, 12)?;
                MetaValue::Vector3f([buf.get_f32(), buf.get_f32(), buf.get_f32()])
            }
            MetaKind::Quaternion => {
                ensure(buf, 16)?;
                MetaValue::Quaternion([buf.get_f32(), buf.get_f32(), buf.get_f32(), buf.get_f32()])
            }
            MetaKind::IntPosition => {
                ensure(buf, 12)?;
                MetaValue::Position(BlockPos::new(buf.get_i32(), buf.get_i32(), buf.get_i32()))
            }
            MetaKind::LegacyPosition => MetaValue::Position(LegacyPosition.read(buf)?),
            MetaKind::Position => MetaValue::Position(Position.read(buf)?),
            MetaKind::OptLegacyPosition => MetaValue::OptPosition(if Bool.read(buf)? {
                Some(LegacyPosition.read(buf)?)
            } else {
                None
            }),
            MetaKind::OptPosition => MetaValue::OptPosition(if Bool.read(buf)? {
                Some(Position.read(buf)?)
            } else {
                None
            }),
            MetaKind::OptUuid => MetaValue::OptUuid(if Bool.read(buf)? {
                Some(UuidType.read(buf)?)
            } else {
                None
            }),
            MetaKind::BlockState | MetaKind::OptBlockState => {
                MetaValue::BlockState(read_varint(buf)?)
            }
            MetaKind::Nbt => MetaValue::Nbt(NamedNbt.read(buf)?),
            MetaKind::NamelessNbt => MetaValue::Nbt(NamelessNbt.read(buf)?),
            MetaKind::Particle => {
                let registry = self.particles.as_ref().ok_or(CodecError::InvalidDiscriminant {
                    what: "metadata type without particle registry",
                    value: -1,
                })?;
                MetaValue::Particle(registry.read(buf, self.item_type())?)
            }
            MetaKind::VillagerData => MetaValue::VillagerData([
                read_varint(buf)?,
                read_varint(buf)?,
                read_varint(buf)?,
            ]),
            MetaKind::OptVarInt => {
                let raw = read_varint(buf)?;
                MetaValue::OptVarInt((raw != 0).then(|| raw - 1))
            }
            MetaKind::OptGlobalPosition => {
                MetaValue::OptGlobalPosition(OptGlobalPosition.read(buf)?)
            }
        })
    }

    fn write_value(&self, kind: MetaKind, value: &MetaValue, buf: &mut BytesMut) {
        match (kind, value) {
            (MetaKind::Byte, MetaValue::Byte(v)) => buf.put_i8(*v),
            (MetaKind::Short, MetaValue::Short(v)) => buf.put_i16(*v),
            (MetaKind::Int, MetaValue::Int(v)) => buf.put_i32(*v),
            (MetaKind::VarInt, MetaValue::VarInt(v)) => write_varint(buf, *v),
            (MetaKind::VarLong, MetaValue::VarLong(v)) => write_varlong(buf, *v),
            (MetaKind::Float, MetaValue::Float(v)) => buf.put_f32(*v),
            (MetaKind::String | MetaKind::Component, MetaValue::String(v)) => {
                write_string(buf, v)
            }
            (MetaKind::OptComponent, MetaValue::OptString(v)) => {
                buf.put_u8(v.is_some() as u8);
                if let Some(v) = v {
                    write_string(buf, v);
                }
            }
            (MetaKind::LegacyItem, MetaValue::Item(item)) => LegacyItemType.write(buf, item),
            (MetaKind::Item, MetaValue::Item(item)) => ItemType::NAMED.write(buf, item),
            (MetaKind::NamelessItem, MetaValue::Item(item)) => ItemType::NAMELESS.write(buf, item),
            (MetaKind::Boolean, MetaValue::Boolean(v)) => buf.put_u8(*v as u8),
            (MetaKind::Rotation | MetaKind::Vector3f, MetaValue::Vector3f(v)) => {
                v.iter().for_each(|f| buf.put_f32(*f))
            }
            (MetaKind::Quaternion, MetaValue::Quaternion(v)) => {
                v.iter().for_each(|f| buf.put_f32(*f))
            }
            (MetaKind::IntPosition, MetaValue::Position(pos)) => {
                buf.put_i32(pos.x);
                buf.put_i32(pos.y);
                buf.put_i32(pos.z);
            }
            (MetaKind::LegacyPosition, MetaValue::Position(pos)) => LegacyPosition.write(buf, pos),
            (MetaKind::Position, MetaValue::Position(pos)) => Position.write(buf, pos),
            (MetaKind::OptLegacyPosition, MetaValue::OptPosition(pos)) => {
                buf.put_u8(pos.is_some() as u8);
                if let Some(pos) = pos {
                    LegacyPosition.write(buf, pos);
                }
            }
            (MetaKind::OptPosition, MetaValue::OptPosition(pos)) => {
                buf.put_u8(pos.is_some() as u8);
                if let Some(pos) = pos {
                    Position.write(buf, pos);
                }
            }
            (MetaKind::OptUuid, MetaValue::OptUuid(uuid)) => {
                buf.put_u8(uuid.is_some() as u8);
                if let Some(uuid) = uuid {
                    write_uuid(buf, uuid);
                }
            }
            (MetaKind::BlockState | MetaKind::OptBlockState, MetaValue::BlockState(v)) => {
                write_varint(buf, *v)
            }
            (MetaKind::Nbt, MetaValue::Nbt(tag)) => NamedNbt.write(buf, tag),
            (MetaKind::NamelessNbt, MetaValue::Nbt(tag)) => NamelessNbt.write(buf, tag),
            (MetaKind::Particle, MetaValue::Particle(p)) => write_particle(buf, p, self.item_type()),
            (MetaKind::VillagerData, MetaValue::VillagerData(v)) => {
                v.iter().for_each(|x| write_varint(buf, *x))
            }
            (MetaKind::OptVarInt, MetaValue::OptVarInt(v)) => {
                write_varint(buf, v.map_or(0, |v| v + 1))
            }
            (MetaKind::OptGlobalPosition, MetaValue::OptGlobalPosition(v)) => {
                OptGlobalPosition.write(buf, v)
            }
            (kind, value) => {
                tracing::error!("Metadata value {:?} does not match encoding {:?}", value, kind);
            }
        }
    }
}

impl WireType for MetadataListType {
    type Value = Vec<Metadata>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Vec<Metadata>> {
        let mut out = Vec::new();
        loop {
            ensure(buf, 1)?;
            let head = buf.get_u8();
            let (index, type_id) = match self.framing {
                MetadataFraming::Legacy => {
                    if head == 0x7F {
                        break;
                    }
                    (head & 0x1F, ((head & 0xE0) >> 5) as i32)
                }
                MetadataFraming::Modern => {
                    if head == 0xFF {
                        break;
                    }
                    (head, read_varint(buf)?)
                }
            };
            let kind = self.kind(type_id).ok_or(CodecError::InvalidDiscriminant {
                what: "metadata type",
                value: type_id,
            })?;
            let value = self.read_value(kind, buf)?;
            out.push(Metadata {
                index,
                type_id,
                value,
            });
        }
        Ok(out)
    }

    fn write(&self, buf: &mut BytesMut, value: &Vec<Metadata>) {
        for entry in value {
            let Some(kind) = self.kind(entry.type_id) else {
                tracing::error!("Skipping metadata with unknown type {}", entry.type_id);
                continue;
            };
            match self.framing {
                MetadataFraming::Legacy => {
                    buf.put_u8(((entry.type_id as u8) << 5) | (entry.index & 0x1F))
                }
                MetadataFraming::Modern => {
                    buf.put_u8(entry.index);
                    write_varint(buf, entry.type_id);
                }
            }
            self.write_value(kind, &entry.value, buf);
        }
        buf.put_u8(match self.framing {
            MetadataFraming::Legacy => 0x7F,
            MetadataFraming::Modern => 0xFF,
        });
    }
}

/// Remaps block states and item ids inside a value.
pub fn remap_value_ids(value: &mut MetaValue, mappings: &MappingData) {
    match value {
        MetaValue::BlockState(state) => *state = mappings.blockstates.get(*state).unwrap_or(0),
        MetaValue::Item(Some(item)) => remap_item(item, mappings),
        MetaValue::Particle(particle) => {
            for field in &mut particle.data {
                match field {
                    ParticleData::BlockState(state) => {
                        *state = mappings.blockstates.get(*state).unwrap_or(0)
                    }
                    ParticleData::Item(Some(item)) => remap_item(item, mappings),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn remap_item(item: &mut Item, mappings: &MappingData) {
    // Items with no equivalent become stone.
    item.id = mappings.items.get(item.id).unwrap_or(1);
}

/// Where one metadata field of one entity type goes in the newer version.
/// `new_type == None` means the field no longer exists and is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataIndexDescriptor {
    pub owner: EntityTypeId,
    pub old_index: u8,
    pub old_type: i32,
    pub new_index: u8,
    pub new_type: Option<i32>,
}

impl MetadataIndexDescriptor {
    pub fn new(owner: EntityTypeId, index: u8, old_type: i32, new_type: Option<i32>) -> Self {
        Self {
            owner,
            old_index: index,
            old_type,
            new_index: index,
            new_type,
        }
    }

    pub fn moved_to(mut self, new_index: u8) -> Self {
        self.new_index = new_index;
        self
    }
}

/// Field descriptors for one version pair, looked up through the entity taxonomy.
#[derive(Debug)]
pub struct MetadataIndexTable {
    registry: Arc<EntityTypeRegistry>,
    descriptors: HashMap<(EntityTypeId, u8), MetadataIndexDescriptor>,
}

impl MetadataIndexTable {
    pub fn build(
        registry: Arc<EntityTypeRegistry>,
        descriptors: impl IntoIterator<Item = MetadataIndexDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut table = HashMap::new();
        for descriptor in descriptors {
            let key = (descriptor.owner, descriptor.old_index);
            if table.contains_key(&key) {
                return Err(RegistryError::DuplicateDescriptor {
                    entity: registry.identifier(descriptor.owner),
                    index: descriptor.old_index,
                });
            }
            table.insert(key, descriptor);
        }
        Ok(Self {
            registry,
            descriptors: table,
        })
    }

    pub fn registry(&self) -> &Arc<EntityTypeRegistry> {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Nearest descriptor for `index` on `ty` or any of its ancestors.
    pub fn find_descriptor(&self, ty: EntityTypeId, index: u8) -> Option<&MetadataIndexDescriptor> {
        self.registry
            .ancestors(ty)
            .find_map(|t| self.descriptors.get(&(t, index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::{registry, TestEntity};

    fn legacy_list() -> MetadataListType {
        MetadataListType::new(
            MetadataFraming::Legacy,
            vec![
                MetaKind::Byte,
                MetaKind::Short,
                MetaKind::Int,
                MetaKind::Float,
                MetaKind::String,
                MetaKind::LegacyItem,
                MetaKind::IntPosition,
                MetaKind::Rotation,
            ],
        )
    }

    #[test]
    fn test_legacy_framing() {
        let entries = vec![
            Metadata {
                index: 0,
                type_id: 0,
                value: MetaValue::Byte(0x20),
            },
            Metadata {
                index: 6,
                type_id: 3,
                value: MetaValue::Float(20.0),
            },
        ];
        let mut buf = BytesMut::new();
        legacy_list().write(&mut buf, &entries);
        assert_eq!(buf[0], 0x00);
        assert_eq!(buf[2], (3 << 5) | 6);
        assert_eq!(*buf.last().unwrap(), 0x7F);
        assert_eq!(legacy_list().read(&mut buf.freeze()).unwrap(), entries);
    }

    #[test]
    fn test_modern_framing_and_particles() {
        let particles = Arc::new(ParticleRegistry::from_identifiers(&[
            "minecraft:flame".into(),
            "minecraft:block".into(),
        ]));
        let list = MetadataListType::new(
            MetadataFraming::Modern,
            vec![MetaKind::Byte, MetaKind::Particle],
        )
        .with_particles(particles);
        let entries = vec![Metadata {
            index: 9,
            type_id: 1,
            value: MetaValue::Particle(Particle {
                id: 1,
                data: vec![ParticleData::BlockState(42)],
            }),
        }];
        let mut buf = BytesMut::new();
        list.write(&mut buf, &entries);
        assert_eq!(&buf[..], &[9, 1, 1, 42, 0xFF]);
        assert_eq!(list.read(&mut buf.freeze()).unwrap(), entries);
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let list = MetadataListType::new(MetadataFraming::Modern, vec![MetaKind::Byte]);
        let mut buf = Bytes::from_static(&[0, 7, 0, 0xFF]);
        assert!(matches!(
            list.read(&mut buf),
            Err(CodecError::InvalidDiscriminant { value: 7, .. })
        ));
    }

    #[test]
    fn test_missing_terminator_is_malformed() {
        let mut buf = Bytes::from_static(&[0x00, 0x01]);
        assert!(matches!(legacy_list().read(&mut buf), Err(CodecError::NotEnoughData)));
    }

    #[test]
    fn test_coercions() {
        assert_eq!(
            MetaValue::Byte(1).coerce(MetaKind::Byte, MetaKind::Boolean),
            Some(MetaValue::Boolean(true))
        );
        assert_eq!(
            MetaValue::Short(300).coerce(MetaKind::Short, MetaKind::VarInt),
            Some(MetaValue::VarInt(300))
        );
        assert_eq!(MetaValue::Float(1.0).coerce(MetaKind::Float, MetaKind::String), None);
        assert_eq!(
            MetaValue::String("069a79f4-44e9-4726-a5be-fca90e38aaf5".into())
                .coerce(MetaKind::String, MetaKind::OptUuid),
            Some(MetaValue::OptUuid(Some(Uuid::from_u128(
                0x069a79f4_44e9_4726_a5be_fca90e38aaf5
            ))))
        );
        assert_eq!(
            MetaValue::String(String::new()).coerce(MetaKind::String, MetaKind::OptUuid),
            Some(MetaValue::OptUuid(None))
        );
    }

    #[test]
    fn test_map_type_prefers_same_id() {
        let old = MetadataListType::new(
            MetadataFraming::Modern,
            vec![MetaKind::Byte, MetaKind::VarInt, MetaKind::Item, MetaKind::VarInt],
        );
        let new = MetadataListType::new(
            MetadataFraming::Modern,
            vec![MetaKind::Byte, MetaKind::VarInt, MetaKind::NamelessItem, MetaKind::VarInt],
        );
        assert_eq!(new.map_type_from(&old, 3), Some((3, MetaKind::VarInt)));
        assert_eq!(new.map_type_from(&old, 2), Some((2, MetaKind::NamelessItem)));
        assert_eq!(
            new.map_type_from(&legacy_list(), 7),
            None,
            "rotations have no modern encoding in this list"
        );
    }

    #[test]
    fn test_descriptor_lookup_walks_parents() {
        let reg = Arc::new(registry());
        let table = MetadataIndexTable::build(
            reg,
            [
                MetadataIndexDescriptor::new(TestEntity::Living.id(), 6, 3, Some(2)),
                MetadataIndexDescriptor::new(TestEntity::Zombie.id(), 12, 0, Some(6)).moved_to(11),
                MetadataIndexDescriptor::new(TestEntity::Husk.id(), 12, 0, None),
            ],
        )
        .unwrap();
        let zombie = table.find_descriptor(TestEntity::Zombie.id(), 12).unwrap();
        assert_eq!(zombie.new_index, 11);
        assert_eq!(table.find_descriptor(TestEntity::Husk.id(), 12).unwrap().new_type, None);
        assert_eq!(table.find_descriptor(TestEntity::Husk.id(), 6).unwrap().owner, TestEntity::Living.id());
        assert!(table.find_descriptor(TestEntity::Boat.id(), 6).is_none());
    }

    #[test]
    fn test_duplicate_descriptor_rejected() {
        let result = MetadataIndexTable::build(
            Arc::new(registry()),
            [
                MetadataIndexDescriptor::new(TestEntity::Zombie.id(), 12, 0, Some(6)),
                MetadataIndexDescriptor::new(TestEntity::Zombie.id(), 12, 0, None),
            ],
        );
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateDescriptor { entity: "zombie", index: 12 })
        ));
    }

    #[test]
    fn test_block_states_remapped() {
        let mappings = MappingData {
            blockstates: viaduct_data::IdMap::from_pairs([(5, 9), (6, -1)]),
            ..MappingData::default()
        };
        let mut value = MetaValue::BlockState(5);
        remap_value_ids(&mut value, &mappings);
        assert_eq!(value, MetaValue::BlockState(9));
        let mut value = MetaValue::BlockState(6);
        remap_value_ids(&mut value, &mappings);
        assert_eq!(value, MetaValue::BlockState(0));
    }
}
