use crate::chunk::{read_sections, write_sections};
use crate::entity_types::{entity_registry, EntityType1_19_4};
use crate::meta_types::{metadata_1_20, metadata_1_20_2};
use crate::packets::{clientbound, configuration, serverbound, LOGIN_ACKNOWLEDGED};
use std::sync::Arc;
use tracing::{debug, trace};
use viaduct_data::MappingData;
use viaduct_protocol_core::types::{
    Bool, Byte, ByteArray, Double, Int, ItemType, Long, NamedNbt, NamelessNbt, OptGlobalPosition,
    Short, Str, StrArray, UnsignedByte, UuidType, VarInt,
};
use viaduct_protocol_core::{
    ConnectionState, DefinitionError, DimensionRegistry, PacketWrapper, ProtocolDefinition,
    ProtocolProvider, ProtocolVersion, TranslationError, WorldData,
};

const CONFIGURATION: ConnectionState = ConnectionState::Configuration;
const PLAY: ConnectionState = ConnectionState::Play;

pub struct Protocol1_20_2To1_20;

impl ProtocolProvider for Protocol1_20_2To1_20 {
    fn server_version(&self) -> ProtocolVersion {
        ProtocolVersion::V1_20
    }

    fn client_version(&self) -> ProtocolVersion {
        ProtocolVersion::V1_20_2
    }

    fn build(&self, mappings: Arc<MappingData>) -> Result<ProtocolDefinition, DefinitionError> {
        let registry = Arc::new(entity_registry(&mappings)?);
        let old_meta = Arc::new(metadata_1_20(&mappings));
        let new_meta = Arc::new(metadata_1_20_2(&mappings));
        let player_code = registry.wire_code(EntityType1_19_4::Player.id());
        let features = mappings.enabled_features.clone();

        let mut builder = ProtocolDefinition::builder(self.server_version(), self.client_version());
        builder
            .entity_types(registry.clone())
            .mappings(mappings)
            .block_state_data_type(EntityType1_19_4::FallingBlock.id());

        builder
            .register_tracker_with_data(
                clientbound::SPAWN_ENTITY,
                clientbound::SPAWN_ENTITY,
                registry.root(),
            )
            .register_metadata_rewriter(
                clientbound::ENTITY_METADATA,
                0x54,
                old_meta,
                new_meta,
            )
            .register_remove_entities(clientbound::REMOVE_ENTITIES, 0x40)
            .register_clientbound(PLAY, clientbound::JOIN_GAME, 0x29, move |w| {
                join_game(w, &features)
            })
            .register_clientbound(PLAY, clientbound::RESPAWN, 0x43, respawn)
            .register_clientbound(PLAY, clientbound::ENTITY_EFFECT, 0x6E, entity_effect)
            .register_clientbound(PLAY, clientbound::CHUNK_DATA, 0x25, chunk_data)
            .register_clientbound(PLAY, clientbound::CONTAINER_CONTENT, 0x13, container_content)
            .register_clientbound(PLAY, clientbound::CONTAINER_SLOT, 0x15, container_slot)
            .register_clientbound(
                PLAY,
                clientbound::SPAWN_PLAYER,
                clientbound::SPAWN_ENTITY,
                move |w| spawn_player(w, player_code),
            )
            .cancel_clientbound(PLAY, clientbound::UPDATE_ENABLED_FEATURES);

        let handled = [
            clientbound::SPAWN_ENTITY,
            clientbound::SPAWN_PLAYER,
            clientbound::CONTAINER_CONTENT,
            clientbound::CONTAINER_SLOT,
            clientbound::CHUNK_DATA,
            clientbound::JOIN_GAME,
            clientbound::REMOVE_ENTITIES,
            clientbound::RESPAWN,
            clientbound::ENTITY_METADATA,
            clientbound::UPDATE_ENABLED_FEATURES,
            clientbound::ENTITY_EFFECT,
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
            .cancel_serverbound(PLAY, serverbound::CHUNK_BATCH_RECEIVED)
            .cancel_serverbound(PLAY, serverbound::CONFIGURATION_ACK)
            .unsupported_serverbound(
                PLAY,
                serverbound::PING_REQUEST,
                "1.20 servers do not answer ping requests",
            )
            .cancel_serverbound(ConnectionState::Login, LOGIN_ACKNOWLEDGED)
            .cancel_serverbound(CONFIGURATION, configuration::serverbound::FINISH_CONFIGURATION);

        // The server is already in play while the client configures.
        for (id, mapped) in [
            (
                configuration::serverbound::CLIENT_INFORMATION,
                serverbound::PLAY_CLIENT_INFORMATION,
            ),
            (
                configuration::serverbound::PLUGIN_MESSAGE,
                serverbound::PLAY_PLUGIN_MESSAGE,
            ),
            (configuration::serverbound::KEEP_ALIVE, serverbound::PLAY_KEEP_ALIVE),
            (configuration::serverbound::PONG, serverbound::PLAY_PONG),
            (
                configuration::serverbound::RESOURCE_PACK,
                serverbound::PLAY_RESOURCE_PACK,
            ),
        ] {
            builder.register_serverbound(CONFIGURATION, id, mapped, |w| {
                w.set_phase(PLAY);
                Ok(())
            });
        }

        builder.build()
    }
}

/// Moves the registry codec into the configuration phase and reorders the
/// remaining fields.
fn join_game(w: &mut PacketWrapper<'_>, features: &[String]) -> Result<(), TranslationError> {
    let entity_id = w.passthrough(Int)?;
    w.passthrough(Bool)?;
    let gamemode = w.read(UnsignedByte)?;
    let previous_gamemode = w.read(Byte)?;
    w.passthrough(StrArray)?;
    let codec = w.read(NamedNbt)?;
    let dimension_type = w.read(Str)?;
    let world = w.read(Str)?;
    let seed = w.read(Long)?;

    // Max players, view distance, simulation distance.
    for _ in 0..3 {
        w.passthrough(VarInt)?;
    }
    w.passthrough(Bool)?;
    w.passthrough(Bool)?;
    // Limited crafting.
    w.write(Bool, false);
    w.write_ref(Str, &dimension_type);
    w.write(Str, world);
    w.write(Long, seed);
    w.write(Byte, gamemode as i8);
    w.write(Byte, previous_gamemode);

    let session = w.session();
    if let Some(codec) = &codec {
        session.dimensions = DimensionRegistry::from_codec(codec);
    }
    session.world = session.dimensions.get(&dimension_type).map(WorldData::from_dimension);
    if session.world.is_none() {
        debug!("Joined unknown dimension type {}", dimension_type);
    }
    session
        .tracker
        .set_player(entity_id, EntityType1_19_4::Player.id());

    let mut registry_data = w.create(configuration::clientbound::REGISTRY_DATA);
    registry_data.write(NamelessNbt, codec);
    w.send(registry_data, CONFIGURATION);

    let mut enabled_features = w.create(configuration::clientbound::UPDATE_ENABLED_FEATURES);
    enabled_features.write_ref(StrArray, &features.to_vec());
    w.schedule_send(enabled_features, CONFIGURATION);

    let finish = w.create(configuration::clientbound::FINISH_CONFIGURATION);
    w.send(finish, CONFIGURATION);
    w.send_current(PLAY);
    Ok(())
}

/// The data-kept flags move behind the death location and portal cooldown.
fn respawn(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    let dimension_type = w.passthrough(Str)?;
    w.passthrough(Str)?;
    w.passthrough(Long)?;
    w.passthrough(UnsignedByte)?;
    w.passthrough(Byte)?;
    w.passthrough(Bool)?;
    w.passthrough(Bool)?;
    let data_kept = w.read(Byte)?;
    w.passthrough(OptGlobalPosition)?;
    w.passthrough(VarInt)?;
    w.write(Byte, data_kept);

    let session = w.session();
    match session.dimensions.get(&dimension_type) {
        Some(dimension) => session.world = Some(WorldData::from_dimension(dimension)),
        None => debug!("Respawn into unknown dimension type {}", dimension_type),
    }
    Ok(())
}

fn entity_effect(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    w.passthrough(VarInt)?;
    w.passthrough(VarInt)?;
    w.passthrough(Byte)?;
    w.passthrough(VarInt)?;
    w.passthrough(Byte)?;
    if w.passthrough(Bool)? {
        let factor = w.read(NamedNbt)?;
        w.write(NamelessNbt, factor);
    }
    Ok(())
}

fn chunk_data(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    w.passthrough(Int)?;
    w.passthrough(Int)?;
    let heightmaps = w.read(NamedNbt)?;
    w.write(NamelessNbt, heightmaps);

    let sections = w
        .session()
        .world
        .as_ref()
        .map(WorldData::section_count)
        .ok_or(TranslationError::MissingState("world data"))?;
    let data = w.read(ByteArray)?;
    let mut parsed = read_sections(&data, sections)?;
    let blockstates = &w.definition().mappings().blockstates;
    for section in &mut parsed {
        section.remap_blocks(|state| blockstates.get(state).unwrap_or(0));
    }
    w.write(ByteArray, write_sections(&parsed));

    let block_entities = w.passthrough(VarInt)?;
    for _ in 0..block_entities {
        w.passthrough(UnsignedByte)?;
        w.passthrough(Short)?;
        w.passthrough(VarInt)?;
        let tag = w.read(NamedNbt)?;
        w.write(NamelessNbt, tag);
    }
    trace!("Rewrote chunk with {} sections", sections);
    Ok(())
}

fn container_content(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    w.passthrough(UnsignedByte)?;
    w.passthrough(VarInt)?;
    let count = w.passthrough(VarInt)?;
    for _ in 0..count {
        let item = w.read(ItemType::NAMED)?;
        w.write(ItemType::NAMELESS, item);
    }
    let carried = w.read(ItemType::NAMED)?;
    w.write(ItemType::NAMELESS, carried);
    Ok(())
}

fn container_slot(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    w.passthrough(Byte)?;
    w.passthrough(VarInt)?;
    w.passthrough(Short)?;
    let item = w.read(ItemType::NAMED)?;
    w.write(ItemType::NAMELESS, item);
    Ok(())
}

/// Players are spawned with the generic spawn entity packet in 1.20.2.
fn spawn_player(w: &mut PacketWrapper<'_>, player_code: Option<i32>) -> Result<(), TranslationError> {
    let code = player_code.ok_or(TranslationError::MissingState("player entity code"))?;
    let entity_id = w.passthrough(VarInt)?;
    w.passthrough(UuidType)?;
    w.write(VarInt, code);
    for _ in 0..3 {
        w.passthrough(Double)?;
    }
    let yaw = w.read(Byte)?;
    let pitch = w.read(Byte)?;
    w.write(Byte, pitch);
    w.write(Byte, yaw);
    // Head yaw, data, velocity.
    w.write(Byte, yaw);
    w.write(VarInt, 0);
    for _ in 0..3 {
        w.write(Short, 0);
    }
    w.session()
        .tracker
        .on_spawn(entity_id, EntityType1_19_4::Player.id());
    Ok(())
}
