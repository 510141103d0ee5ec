//! Entity packet rewrites shared by every version pair.

use crate::entity::EntityTypeId;
use crate::error::TranslationError;
use crate::metadata::{remap_value_ids, Metadata, MetadataListType};
use crate::types::{Byte, Double, UuidType, VarInt, VarIntArray};
use crate::wrapper::PacketWrapper;
use tracing::{debug, trace, warn};

/// Resolves a spawn's type code, counting misses and falling back to the root type.
pub fn resolve_entity(
    wrapper: &mut PacketWrapper<'_>,
    code: i32,
    is_object: bool,
    data: i32,
) -> Result<EntityTypeId, TranslationError> {
    let registry = wrapper
        .definition()
        .entity_types()
        .ok_or(TranslationError::MissingState("entity types"))?;
    match registry.resolve(code, is_object, data) {
        Ok(ty) => Ok(ty),
        Err(_) => {
            wrapper.session().stats.unknown_entity_types += 1;
            Ok(registry.resolve_or_fallback(code, is_object, data))
        }
    }
}

/// Spawn entity (1.19+ layout): tracks the entity and remaps block state data
/// for the definition's block state data type.
pub fn track_spawn_with_data(
    wrapper: &mut PacketWrapper<'_>,
    fallback: EntityTypeId,
) -> Result<(), TranslationError> {
    let definition = wrapper.definition();
    let registry = definition
        .entity_types()
        .ok_or(TranslationError::MissingState("entity types"))?;
    let entity_id = wrapper.passthrough(VarInt)?;
    wrapper.passthrough(UuidType)?;
    let code = wrapper.passthrough(VarInt)?;
    let ty = match registry.resolve(code, false, 0) {
        Ok(ty) => ty,
        Err(err) => {
            wrapper.session().stats.unknown_entity_types += 1;
            warn!("{}, tracking as {}", err, registry.identifier(fallback));
            fallback
        }
    };
    wrapper.session().tracker.on_spawn(entity_id, ty);
    trace!("Tracking {} as {}", entity_id, registry.identifier(ty));

    if definition.block_state_data_type() == Some(ty) {
        for _ in 0..3 {
            wrapper.passthrough(Double)?;
        }
        for _ in 0..3 {
            wrapper.passthrough(Byte)?;
        }
        let state = wrapper.read(VarInt)?;
        wrapper.write(VarInt, definition.mappings().blockstates.get(state).unwrap_or(0));
    }
    Ok(())
}

/// Entity id followed by a metadata list.
pub fn rewrite_metadata_packet(
    wrapper: &mut PacketWrapper<'_>,
    old: &MetadataListType,
    new: &MetadataListType,
) -> Result<(), TranslationError> {
    let entity_id = wrapper.passthrough(VarInt)?;
    let entries = wrapper.read(old)?;
    let rewritten = rewrite_metadata(wrapper, entity_id, entries, old, new);
    wrapper.write(new, rewritten);
    Ok(())
}

/// Translates one entity's metadata list.
///
/// With an index table every entry goes through the table: no descriptor
/// means the field is skipped, a descriptor without a target type means it is
/// dropped. Fields of an entity that was never tracked cannot be looked up and
/// are all dropped. Pairs without a table keep the index and map only the type.
pub fn rewrite_metadata(
    wrapper: &mut PacketWrapper<'_>,
    entity_id: i32,
    entries: Vec<Metadata>,
    old: &MetadataListType,
    new: &MetadataListType,
) -> Vec<Metadata> {
    let definition = wrapper.definition();
    let table = definition.metadata_index();
    let tracked = wrapper.session().tracker.lookup(entity_id);
    let indexed = match (table, tracked) {
        (Some(table), Some(ty)) => Some((table, ty)),
        (Some(_), None) => {
            wrapper.session().stats.untracked_metadata += 1;
            debug!(
                "Dropping {} metadata entries of untracked entity {}",
                entries.len(),
                entity_id
            );
            return Vec::new();
        }
        (None, _) => None,
    };

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(old_kind) = old.kind(entry.type_id) else {
            continue;
        };
        let target = match indexed {
            Some((table, ty)) => match table.find_descriptor(ty, entry.index) {
                None => {
                    wrapper.session().stats.unmapped_metadata += 1;
                    debug!(
                        "{}",
                        TranslationError::UnmappedMetadataField {
                            entity: table.registry().identifier(ty),
                            index: entry.index,
                        }
                    );
                    continue;
                }
                Some(descriptor) => match descriptor.new_type {
                    None => {
                        wrapper.session().stats.dropped_metadata += 1;
                        trace!("Dropping metadata index {} of {}", entry.index, entity_id);
                        continue;
                    }
                    Some(new_type) => new.kind(new_type).map(|k| (descriptor.new_index, new_type, k)),
                },
            },
            None => new
                .map_type_from(old, entry.type_id)
                .map(|(type_id, kind)| (entry.index, type_id, kind)),
        };
        let Some((index, type_id, new_kind)) = target else {
            wrapper.session().stats.dropped_metadata += 1;
            debug!("No target encoding for metadata index {} ({:?})", entry.index, old_kind);
            continue;
        };
        let Some(mut value) = entry.value.coerce(old_kind, new_kind) else {
            wrapper.session().stats.dropped_metadata += 1;
            debug!("Cannot convert metadata index {} from {:?} to {:?}", entry.index, old_kind, new_kind);
            continue;
        };
        remap_value_ids(&mut value, definition.mappings());
        out.push(Metadata {
            index,
            type_id,
            value,
        });
    }
    out
}

/// Varint array of entity ids; forgets each one.
pub fn remove_entities(wrapper: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    let ids = wrapper.passthrough(VarIntArray)?;
    wrapper.session().tracker.on_remove(&ids);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::{registry, TestEntity};
    use crate::metadata::{
        MetaKind, MetaValue, MetadataFraming, MetadataIndexDescriptor, MetadataIndexTable,
    };
    use crate::protocol::ProtocolDefinition;
    use crate::session::Session;
    use crate::types::WireType;
    use crate::wrapper::RawPacket;
    use crate::{codec::write_varint, ConnectionState, Direction, ProtocolVersion};
    use bytes::{BufMut, BytesMut};
    use std::sync::Arc;

    const OLD_BYTE: i32 = 0;
    const OLD_FLOAT: i32 = 1;
    const NEW_BYTE: i32 = 0;
    const NEW_BOOLEAN: i32 = 1;
    const NEW_FLOAT: i32 = 2;

    fn lists() -> (Arc<MetadataListType>, Arc<MetadataListType>) {
        (
            Arc::new(MetadataListType::new(
                MetadataFraming::Legacy,
                vec![MetaKind::Byte, MetaKind::Float],
            )),
            Arc::new(MetadataListType::new(
                MetadataFraming::Modern,
                vec![MetaKind::Byte, MetaKind::Boolean, MetaKind::Float],
            )),
        )
    }

    fn definition() -> ProtocolDefinition {
        let registry = Arc::new(registry());
        let table = MetadataIndexTable::build(
            registry.clone(),
            [
                MetadataIndexDescriptor::new(TestEntity::Entity.id(), 0, OLD_BYTE, Some(NEW_BYTE)),
                MetadataIndexDescriptor::new(TestEntity::Living.id(), 6, OLD_FLOAT, Some(NEW_FLOAT)),
                MetadataIndexDescriptor::new(TestEntity::Zombie.id(), 12, OLD_BYTE, Some(NEW_BOOLEAN))
                    .moved_to(11),
                MetadataIndexDescriptor::new(TestEntity::Zombie.id(), 14, OLD_BYTE, None),
            ],
        )
        .unwrap();
        let (old, new) = lists();
        let mut builder =
            ProtocolDefinition::builder(ProtocolVersion::V1_8, ProtocolVersion::V1_9);
        builder
            .entity_types(registry)
            .metadata_index(Arc::new(table))
            .register_metadata_rewriter(0x1C, 0x39, old, new)
            .register_tracker_with_data(0x01, 0x01, TestEntity::Boat.id())
            .register_remove_entities(0x13, 0x30);
        builder.build().unwrap()
    }

    fn metadata_packet(entity_id: i32, entries: &[Metadata]) -> RawPacket {
        let (old, _) = lists();
        let mut buf = BytesMut::new();
        write_varint(&mut buf, entity_id);
        old.write(&mut buf, &entries.to_vec());
        RawPacket::new(0x1C, ConnectionState::Play, buf.freeze())
    }

    fn decode_metadata(packet: &RawPacket) -> (i32, Vec<Metadata>) {
        let (_, new) = lists();
        let mut payload = packet.payload.clone();
        let id = VarInt.read(&mut payload).unwrap();
        (id, new.read(&mut payload).unwrap())
    }

    fn entry(index: u8, type_id: i32, value: MetaValue) -> Metadata {
        Metadata {
            index,
            type_id,
            value,
        }
    }

    #[test]
    fn test_tracked_metadata_uses_index_table() {
        let def = definition();
        let mut session = Session::new();
        session.tracker.on_spawn(5, TestEntity::Zombie.id());
        let packet = metadata_packet(
            5,
            &[
                entry(12, OLD_BYTE, MetaValue::Byte(1)),
                entry(6, OLD_FLOAT, MetaValue::Float(20.0)),
            ],
        );
        let out = def.translate(Direction::Clientbound, packet, &mut session).unwrap();
        assert_eq!(out[0].id, 0x39);
        let (id, entries) = decode_metadata(&out[0]);
        assert_eq!(id, 5);
        assert_eq!(
            entries,
            vec![
                entry(11, NEW_BOOLEAN, MetaValue::Boolean(true)),
                entry(6, NEW_FLOAT, MetaValue::Float(20.0)),
            ]
        );
    }

    #[test]
    fn test_null_target_and_missing_descriptor_are_dropped() {
        let def = definition();
        let mut session = Session::new();
        session.tracker.on_spawn(5, TestEntity::Husk.id());
        let packet = metadata_packet(
            5,
            &[
                entry(14, OLD_BYTE, MetaValue::Byte(1)),
                entry(20, OLD_BYTE, MetaValue::Byte(1)),
                entry(0, OLD_BYTE, MetaValue::Byte(0x02)),
            ],
        );
        let out = def.translate(Direction::Clientbound, packet, &mut session).unwrap();
        let (_, entries) = decode_metadata(&out[0]);
        assert_eq!(entries, vec![entry(0, NEW_BYTE, MetaValue::Byte(0x02))]);
        assert_eq!(session.stats.dropped_metadata, 1);
        assert_eq!(session.stats.unmapped_metadata, 1);
    }

    #[test]
    fn test_untracked_metadata_is_dropped() {
        let def = definition();
        let mut session = Session::new();
        let packet = metadata_packet(
            77,
            &[
                entry(12, OLD_BYTE, MetaValue::Byte(1)),
                entry(6, OLD_FLOAT, MetaValue::Float(3.0)),
            ],
        );
        let out = def.translate(Direction::Clientbound, packet, &mut session).unwrap();
        let (id, entries) = decode_metadata(&out[0]);
        assert_eq!(id, 77);
        assert!(entries.is_empty());
        assert_eq!(session.stats.untracked_metadata, 1);
        assert_eq!(session.stats.unmapped_metadata, 0);
    }

    fn spawn_packet(entity_id: i32, code: i32) -> RawPacket {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, entity_id);
        buf.put_u128(0xABCD);
        write_varint(&mut buf, code);
        buf.put_f64(1.0);
        buf.put_f64(2.0);
        buf.put_f64(3.0);
        buf.put_slice(&[0, 0, 0]);
        write_varint(&mut buf, 0);
        buf.put_slice(&[0; 6]);
        RawPacket::new(0x01, ConnectionState::Play, buf.freeze())
    }

    #[test]
    fn test_spawn_is_tracked_and_forwarded_unchanged() {
        let def = definition();
        let mut session = Session::new();
        let packet = spawn_packet(9, 54);
        let out = def
            .translate(Direction::Clientbound, packet.clone(), &mut session)
            .unwrap();
        assert_eq!(out, vec![packet]);
        assert_eq!(session.tracker.lookup(9), Some(TestEntity::Zombie.id()));
    }

    #[test]
    fn test_unknown_spawn_code_uses_fallback() {
        let def = definition();
        let mut session = Session::new();
        def.translate(Direction::Clientbound, spawn_packet(9, 9999), &mut session)
            .unwrap();
        assert_eq!(session.tracker.lookup(9), Some(TestEntity::Boat.id()));
        assert_eq!(session.stats.unknown_entity_types, 1);
    }

    #[test]
    fn test_remove_entities_untracks() {
        let def = definition();
        let mut session = Session::new();
        session.tracker.on_spawn(1, TestEntity::Zombie.id());
        session.tracker.on_spawn(2, TestEntity::Zombie.id());
        let mut buf = BytesMut::new();
        VarIntArray.write(&mut buf, &vec![1]);
        let packet = RawPacket::new(0x13, ConnectionState::Play, buf.freeze());
        let out = def.translate(Direction::Clientbound, packet, &mut session).unwrap();
        assert_eq!(out[0].id, 0x30);
        assert_eq!(session.tracker.lookup(1), None);
        assert!(session.tracker.lookup(2).is_some());
    }
}
