//! Registry id rewrites shared by version pairs: sound events, tags and
//! statistics.

use crate::error::TranslationError;
use crate::types::{Str, VarInt, VarIntArray};
use crate::wrapper::PacketWrapper;
use tracing::{debug, trace};
use viaduct_data::IdMap;
use viaduct_types::normalize_identifier;

/// A tag the client version expects that older servers never send. Ids are
/// already in the client's numbering.
#[derive(Debug, Clone, Copy)]
pub struct ExtraTag {
    pub registry: &'static str,
    pub name: &'static str,
    pub ids: &'static [i32],
}

/// Sound holder of the 1.19.3+ sound packets: `0` followed by an inline sound
/// event, otherwise the sound registry id plus one. A sound without a
/// counterpart cancels the packet.
pub fn rewrite_sound(wrapper: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    let holder = wrapper.read(VarInt)?;
    if holder == 0 {
        wrapper.write(VarInt, 0);
        return Ok(());
    }
    match wrapper.definition().mappings().sounds.get(holder - 1) {
        Some(id) => wrapper.write(VarInt, id + 1),
        None => {
            debug!("Sound {} has no counterpart, dropping packet", holder - 1);
            wrapper.cancel();
        }
    }
    Ok(())
}

/// Update tags: every registry with an id table has its tag members remapped,
/// members without a counterpart are removed, and missing `extra` tags are
/// appended to their registry.
pub fn rewrite_tags(
    wrapper: &mut PacketWrapper<'_>,
    extra: &[ExtraTag],
) -> Result<(), TranslationError> {
    let mappings = wrapper.definition().mappings();
    let registries = wrapper.passthrough(VarInt)?;
    for _ in 0..registries {
        let registry = wrapper.passthrough(Str)?;
        let count = wrapper.read(VarInt)?;
        let mut tags = Vec::new();
        for _ in 0..count {
            let name = wrapper.read(Str)?;
            let ids = wrapper.read(VarIntArray)?;
            tags.push((name, ids));
        }

        if let Some(map) = mappings.registry(&registry) {
            for (_, ids) in &mut tags {
                *ids = remap_ids(map, ids);
            }
        }
        let registry_key = normalize_identifier(&registry);
        for tag in extra {
            if normalize_identifier(tag.registry) != registry_key {
                continue;
            }
            let name = normalize_identifier(tag.name);
            if !tags.iter().any(|(existing, _)| normalize_identifier(existing) == name) {
                trace!("Adding tag {} to {}", tag.name, registry);
                tags.push((tag.name.to_string(), tag.ids.to_vec()));
            }
        }

        wrapper.write(VarInt, tags.len() as i32);
        for (name, ids) in tags {
            wrapper.write(Str, name);
            wrapper.write(VarIntArray, ids);
        }
    }
    Ok(())
}

fn remap_ids(map: &IdMap, ids: &[i32]) -> Vec<i32> {
    ids.iter().filter_map(|&id| map.get(id)).collect()
}

/// Registry a statistic category counts in.
fn statistic_registry(category: i32) -> Option<&'static str> {
    match category {
        0 => Some("block"),
        1..=5 => Some("item"),
        6 | 7 => Some("entity_type"),
        8 => Some("custom_stat"),
        _ => None,
    }
}

/// Award statistics: `(category, statistic, value)` triples. Statistics whose
/// id has no counterpart are left out.
pub fn rewrite_statistics(wrapper: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    let mappings = wrapper.definition().mappings();
    let count = wrapper.read(VarInt)?;
    let mut stats = Vec::new();
    for _ in 0..count {
        let category = wrapper.read(VarInt)?;
        let statistic = wrapper.read(VarInt)?;
        let value = wrapper.read(VarInt)?;
        let mapped = match statistic_registry(category).and_then(|name| mappings.registry(name)) {
            Some(map) => map.get(statistic),
            None => Some(statistic),
        };
        match mapped {
            Some(statistic) => stats.push((category, statistic, value)),
            None => trace!("Dropping statistic {} of category {}", statistic, category),
        }
    }

    wrapper.write(VarInt, stats.len() as i32);
    for (category, statistic, value) in stats {
        wrapper.write(VarInt, category);
        wrapper.write(VarInt, statistic);
        wrapper.write(VarInt, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::write_varint;
    use crate::protocol::ProtocolDefinition;
    use crate::session::Session;
    use crate::types::WireType;
    use crate::wrapper::RawPacket;
    use crate::{ConnectionState, Direction, ProtocolVersion};
    use bytes::{Bytes, BytesMut};
    use std::collections::HashMap;
    use std::sync::Arc;
    use viaduct_data::MappingData;

    const SOUND: i32 = 0x66;
    const TAGS: i32 = 0x74;
    const STATISTICS: i32 = 0x04;
    const DYEABLE: ExtraTag = ExtraTag {
        registry: "minecraft:item",
        name: "minecraft:dyeable",
        ids: &[40, 41],
    };

    fn definition() -> ProtocolDefinition {
        let mappings = MappingData {
            sounds: IdMap::from_pairs([(4, 9), (5, -1)]),
            items: IdMap::from_pairs([(1, 2), (3, -1)]),
            registries: HashMap::from([(
                "minecraft:entity_type".to_string(),
                IdMap::from_pairs([(7, 8)]),
            )]),
            ..Default::default()
        };
        let mut builder =
            ProtocolDefinition::builder(ProtocolVersion::V1_20_3, ProtocolVersion::V1_20_5);
        builder
            .mappings(Arc::new(mappings))
            .register_clientbound(ConnectionState::Play, SOUND, SOUND + 2, rewrite_sound)
            .register_clientbound(ConnectionState::Play, TAGS, TAGS + 4, |w| {
                rewrite_tags(w, &[DYEABLE])
            })
            .register_clientbound(ConnectionState::Play, STATISTICS, STATISTICS, rewrite_statistics);
        builder.build().unwrap()
    }

    fn run(id: i32, body: BytesMut) -> Vec<RawPacket> {
        let packet = RawPacket::new(id, ConnectionState::Play, body.freeze());
        definition()
            .translate(Direction::Clientbound, packet, &mut Session::new())
            .unwrap()
    }

    fn varints(payload: &Bytes) -> Vec<i32> {
        let mut payload = payload.clone();
        let mut out = Vec::new();
        while !payload.is_empty() {
            out.push(VarInt.read(&mut payload).unwrap());
        }
        out
    }

    fn sound_body(holder: i32) -> BytesMut {
        let mut body = BytesMut::new();
        write_varint(&mut body, holder);
        // Category.
        write_varint(&mut body, 3);
        body
    }

    #[test]
    fn test_sound_id_is_remapped() {
        let out = run(SOUND, sound_body(5));
        assert_eq!(out[0].id, SOUND + 2);
        assert_eq!(varints(&out[0].payload), vec![10, 3]);
    }

    #[test]
    fn test_inline_sound_passes_through() {
        let mut body = sound_body(0);
        Str.write(&mut body, &"custom:beep".to_string());
        let expected = body.clone().freeze();
        let out = run(SOUND, body);
        assert_eq!(out[0].payload, expected);
    }

    #[test]
    fn test_removed_sound_cancels_packet() {
        assert!(run(SOUND, sound_body(6)).is_empty());
    }

    fn tags_body(registries: &[(&str, &[(&str, &[i32])])]) -> BytesMut {
        let mut body = BytesMut::new();
        write_varint(&mut body, registries.len() as i32);
        for (registry, tags) in registries {
            Str.write(&mut body, &registry.to_string());
            write_varint(&mut body, tags.len() as i32);
            for (name, ids) in tags.iter() {
                Str.write(&mut body, &name.to_string());
                VarIntArray.write(&mut body, &ids.to_vec());
            }
        }
        body
    }

    #[test]
    fn test_tags_are_remapped_and_extended() {
        let body = tags_body(&[
            ("minecraft:item", &[("minecraft:planks", &[1, 3, 5])]),
            ("minecraft:fluid", &[("minecraft:water", &[1, 2])]),
        ]);
        let out = run(TAGS, body);
        assert_eq!(out[0].id, TAGS + 4);

        let expected = tags_body(&[
            (
                "minecraft:item",
                &[("minecraft:planks", &[2, 5]), ("minecraft:dyeable", &[40, 41])],
            ),
            ("minecraft:fluid", &[("minecraft:water", &[1, 2])]),
        ]);
        assert_eq!(&out[0].payload[..], &expected[..]);
    }

    #[test]
    fn test_existing_extra_tag_is_kept() {
        let body = tags_body(&[("minecraft:item", &[("dyeable", &[2])])]);
        let out = run(TAGS, body);
        let expected = tags_body(&[("minecraft:item", &[("dyeable", &[2])])]);
        assert_eq!(&out[0].payload[..], &expected[..]);
    }

    #[test]
    fn test_statistics_follow_their_registry() {
        let mut body = BytesMut::new();
        write_varint(&mut body, 4);
        // Crafted item 1, killed entity 7, broken item 3 (removed), custom 7.
        for triple in [[1, 1, 10], [6, 7, 2], [3, 3, 1], [8, 7, 5]] {
            for value in triple {
                write_varint(&mut body, value);
            }
        }
        let out = run(STATISTICS, body);
        assert_eq!(
            varints(&out[0].payload),
            vec![3, 1, 2, 10, 6, 8, 2, 8, 7, 5]
        );
    }
}
