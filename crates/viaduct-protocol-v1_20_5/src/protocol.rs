use crate::packets::{clientbound, configuration, login, serverbound};
use crate::structured_data::{ComponentItem, ComponentItemType, StructuredDataSchema};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};
use viaduct_data::MappingData;
use viaduct_nbt::NbtValue;
use viaduct_protocol_core::dimension::DIMENSION_TYPE_REGISTRY;
use viaduct_protocol_core::registry_rewriter::{
    rewrite_sound, rewrite_statistics, rewrite_tags, ExtraTag,
};
use viaduct_protocol_core::types::{
    Bool, Byte, ByteArray, Int, ItemType, Long, NamelessNbt, OptGlobalPosition, Short, Str,
    StrArray, UnsignedByte, VarInt,
};
use viaduct_protocol_core::{
    ConnectionState, DefinitionError, DimensionRegistry, DimensionType, PacketWrapper,
    ProtocolDefinition, ProtocolProvider, ProtocolVersion, TranslationError, WorldData,
};

const LOGIN: ConnectionState = ConnectionState::Login;
const CONFIGURATION: ConnectionState = ConnectionState::Configuration;
const PLAY: ConnectionState = ConnectionState::Play;

/// Login success gained `strict_error_handling` in 1.20.5.
const LOGIN_SUCCESS: i32 = 0x02;

/// Leather armor and leather horse armor.
const DYEABLE: ExtraTag = ExtraTag {
    registry: "minecraft:item",
    name: "minecraft:dyeable",
    ids: &[853, 854, 855, 856, 1120],
};

pub struct Protocol1_20_5To1_20_3;

impl ProtocolProvider for Protocol1_20_5To1_20_3 {
    fn server_version(&self) -> ProtocolVersion {
        ProtocolVersion::V1_20_3
    }

    fn client_version(&self) -> ProtocolVersion {
        ProtocolVersion::V1_20_5
    }

    fn build(&self, mappings: Arc<MappingData>) -> Result<ProtocolDefinition, DefinitionError> {
        let schema = Arc::new(StructuredDataSchema::from_mappings(&mappings));
        debug!("Loaded {} item component keys", schema.len());

        let mut builder = ProtocolDefinition::builder(self.server_version(), self.client_version());
        builder.mappings(mappings);

        builder
            .register_clientbound(LOGIN, login::CLIENTBOUND_HELLO, login::CLIENTBOUND_HELLO, hello)
            .register_clientbound(LOGIN, LOGIN_SUCCESS, LOGIN_SUCCESS, |w| {
                w.passthrough_all();
                w.write(Bool, false);
                Ok(())
            })
            .cancel_serverbound(LOGIN, login::SERVERBOUND_COOKIE_RESPONSE);

        builder.register_clientbound(
            CONFIGURATION,
            configuration::clientbound::REGISTRY_DATA,
            configuration::clientbound::MAPPED_REGISTRY_DATA,
            registry_data,
        );
        for (id, mapped) in configuration::clientbound::REMAPPED {
            builder.remap_clientbound(CONFIGURATION, id, mapped);
        }
        for (id, mapped) in configuration::serverbound::REMAPPED {
            builder.remap_serverbound(CONFIGURATION, id, mapped);
        }
        builder
            .register_clientbound(
                CONFIGURATION,
                configuration::clientbound::UPDATE_TAGS,
                configuration::clientbound::MAPPED_UPDATE_TAGS,
                |w| rewrite_tags(w, &[DYEABLE]),
            )
            .cancel_serverbound(CONFIGURATION, configuration::serverbound::COOKIE_RESPONSE)
            .cancel_serverbound(CONFIGURATION, configuration::serverbound::SELECT_KNOWN_PACKS);

        let content_schema = schema.clone();
        builder
            .register_clientbound(PLAY, clientbound::JOIN_GAME, 0x2B, join_game)
            .register_clientbound(PLAY, clientbound::RESPAWN, 0x47, respawn)
            .register_clientbound(PLAY, clientbound::SERVER_DATA, 0x4B, server_data)
            .register_clientbound(
                PLAY,
                clientbound::CONTAINER_CONTENT,
                clientbound::CONTAINER_CONTENT,
                move |w| container_content(w, &content_schema),
            )
            .register_clientbound(
                PLAY,
                clientbound::CONTAINER_SLOT,
                clientbound::CONTAINER_SLOT,
                move |w| container_slot(w, &schema),
            )
            .register_clientbound(PLAY, clientbound::STATISTICS, clientbound::STATISTICS, rewrite_statistics)
            .register_clientbound(PLAY, clientbound::ENTITY_SOUND, 0x67, rewrite_sound)
            .register_clientbound(PLAY, clientbound::SOUND, 0x68, rewrite_sound)
            .register_clientbound(PLAY, clientbound::UPDATE_TAGS, 0x78, |w| {
                rewrite_tags(w, &[DYEABLE])
            });

        let handled = [
            clientbound::STATISTICS,
            clientbound::CONTAINER_CONTENT,
            clientbound::CONTAINER_SLOT,
            clientbound::JOIN_GAME,
            clientbound::RESPAWN,
            clientbound::SERVER_DATA,
            clientbound::ENTITY_SOUND,
            clientbound::SOUND,
            clientbound::UPDATE_TAGS,
        ];
        for id in 0..=clientbound::LAST {
            match clientbound::mapped(id) {
                Some(mapped) if mapped != id && !handled.contains(&id) => {
                    builder.remap_clientbound(PLAY, id, mapped);
                }
                _ => {}
            }
        }

        for id in 0..=serverbound::LAST {
            if let Some(mapped) = serverbound::mapped(id).filter(|mapped| *mapped != id) {
                builder.remap_serverbound(PLAY, id, mapped);
            }
        }
        builder
            .register_serverbound(
                PLAY,
                serverbound::CHAT_COMMAND,
                serverbound::CHAT_COMMAND,
                chat_command,
            )
            .cancel_serverbound(PLAY, serverbound::COOKIE_RESPONSE)
            .cancel_serverbound(PLAY, serverbound::DEBUG_SAMPLE_SUBSCRIPTION);

        builder.build()
    }
}

fn hello(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    w.passthrough(Str)?;
    w.passthrough(ByteArray)?;
    w.passthrough(ByteArray)?;
    // Should authenticate.
    w.write(Bool, true);
    Ok(())
}

/// The secure chat flag moved to join game.
fn server_data(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    w.passthrough(NamelessNbt)?;
    if w.passthrough(Bool)? {
        w.passthrough(ByteArray)?;
    }
    w.read(Bool)?;
    Ok(())
}

/// Splits the registry codec into one packet per registry and caches the
/// dimension types in the order the client numbers them.
fn registry_data(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    w.cancel();
    let Some(NbtValue::Compound(registries)) = w.read(NamelessNbt)? else {
        debug!("Registry data without a compound codec");
        return Ok(());
    };

    for (registry, value) in registries {
        let mut entries: Vec<(i64, String, Option<NbtValue>)> = value
            .get("value")
            .and_then(NbtValue::as_list)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let name = entry.get("name")?.as_str()?.to_string();
                let id = entry
                    .get("id")
                    .and_then(NbtValue::as_long)
                    .unwrap_or(index as i64);
                Some((id, name, entry.get("element").cloned()))
            })
            .collect();
        entries.sort_by_key(|(id, _, _)| *id);

        if registry == DIMENSION_TYPE_REGISTRY {
            let dimensions = entries
                .iter()
                .enumerate()
                .filter_map(|(index, (_, name, element))| {
                    let element = element.as_ref()?;
                    Some(DimensionType {
                        name: name.clone(),
                        id: index as i32,
                        min_y: element.get("min_y")?.as_long()? as i32,
                        height: element.get("height")?.as_long()? as i32,
                    })
                })
                .collect();
            w.session().dimensions = DimensionRegistry::from_entries(dimensions);
        }

        trace!("Sending registry {} with {} entries", registry, entries.len());
        let mut packet = w.create(configuration::clientbound::MAPPED_REGISTRY_DATA);
        packet
            .write(Str, registry)
            .write(VarInt, entries.len() as i32);
        for (_, name, element) in entries {
            packet.write(Str, name).write(Bool, element.is_some());
            if element.is_some() {
                packet.write(NamelessNbt, element);
            }
        }
        w.send(packet, CONFIGURATION);
    }
    Ok(())
}

fn dimension_id(w: &mut PacketWrapper<'_>, dimension_type: &str) -> Result<i32, TranslationError> {
    let session = w.session();
    if session.dimensions.is_empty() {
        return Err(TranslationError::MissingState("dimension registry"));
    }
    let dimension = session
        .dimensions
        .get(dimension_type)
        .ok_or_else(|| TranslationError::Custom(format!("unknown dimension type {}", dimension_type)))?;
    let id = dimension.id;
    session.world = Some(WorldData::from_dimension(dimension));
    Ok(id)
}

fn join_game(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    w.passthrough(Int)?;
    w.passthrough(Bool)?;
    w.passthrough(StrArray)?;
    // Max players, view distance, simulation distance.
    for _ in 0..3 {
        w.passthrough(VarInt)?;
    }
    // Reduced debug info, respawn screen, limited crafting.
    for _ in 0..3 {
        w.passthrough(Bool)?;
    }
    let dimension_type = w.read(Str)?;
    let id = dimension_id(w, &dimension_type)?;
    w.write(VarInt, id);
    w.passthrough(Str)?;
    w.passthrough(Long)?;
    w.passthrough(UnsignedByte)?;
    w.passthrough(Byte)?;
    w.passthrough(Bool)?;
    w.passthrough(Bool)?;
    w.passthrough(OptGlobalPosition)?;
    w.passthrough(VarInt)?;
    // Enforces secure chat.
    w.write(Bool, false);
    Ok(())
}

fn respawn(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    let dimension_type = w.read(Str)?;
    let id = dimension_id(w, &dimension_type)?;
    w.write(VarInt, id);
    w.passthrough_all();
    Ok(())
}

fn rewrite_item(w: &mut PacketWrapper<'_>, schema: &StructuredDataSchema) -> Result<(), TranslationError> {
    let item = w.read(ItemType::NAMELESS)?;
    let items = &w.definition().mappings().items;
    let converted = item.and_then(|item| ComponentItem::from_legacy(item, items));
    w.write(ComponentItemType { schema }, converted);
    Ok(())
}

fn container_content(
    w: &mut PacketWrapper<'_>,
    schema: &StructuredDataSchema,
) -> Result<(), TranslationError> {
    w.passthrough(UnsignedByte)?;
    w.passthrough(VarInt)?;
    let count = w.passthrough(VarInt)?;
    for _ in 0..count {
        rewrite_item(w, schema)?;
    }
    rewrite_item(w, schema)
}

fn container_slot(w: &mut PacketWrapper<'_>, schema: &StructuredDataSchema) -> Result<(), TranslationError> {
    w.passthrough(Byte)?;
    w.passthrough(VarInt)?;
    w.passthrough(Short)?;
    rewrite_item(w, schema)
}

/// Unsigned commands are sent as 1.20.3 commands without argument signatures.
fn chat_command(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    w.passthrough(Str)?;
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64);
    w.write(Long, timestamp);
    // Salt, argument signatures, acknowledged message count.
    w.write(Long, 0);
    w.write(VarInt, 0);
    w.write(VarInt, 0);
    // Acknowledged bitset, 20 bits.
    for _ in 0..3 {
        w.write(Byte, 0);
    }
    Ok(())
}
