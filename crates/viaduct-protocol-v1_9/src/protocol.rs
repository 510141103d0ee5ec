use crate::entity_types::{entity_registry, EntityType1_8};
use crate::meta_index::metadata_index;
use crate::meta_types::{legacy_metadata, metadata_1_9};
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;
use viaduct_data::MappingData;
use viaduct_protocol_core::rewriter;
use viaduct_protocol_core::types::{Byte, Double, Int, Short, UnsignedByte, UuidType, VarInt};
use viaduct_protocol_core::{
    ConnectionState, DefinitionError, MetadataListType, PacketWrapper, ProtocolDefinition,
    ProtocolProvider, ProtocolVersion, TranslationError,
};

const PLAY: ConnectionState = ConnectionState::Play;

mod clientbound {
    pub const KEEP_ALIVE: (i32, i32) = (0x00, 0x1F);
    pub const JOIN_GAME: (i32, i32) = (0x01, 0x23);
    pub const CHAT: (i32, i32) = (0x02, 0x0F);
    pub const SPAWN_PLAYER: (i32, i32) = (0x0C, 0x05);
    pub const SPAWN_OBJECT: (i32, i32) = (0x0E, 0x00);
    pub const SPAWN_MOB: (i32, i32) = (0x0F, 0x03);
    pub const DESTROY_ENTITIES: (i32, i32) = (0x13, 0x30);
    pub const ENTITY_METADATA: (i32, i32) = (0x1C, 0x39);
    pub const DISCONNECT: (i32, i32) = (0x40, 0x1A);
}

mod serverbound {
    pub const TELEPORT_CONFIRM: i32 = 0x00;
    pub const CHAT: (i32, i32) = (0x02, 0x01);
    pub const KEEP_ALIVE: (i32, i32) = (0x0B, 0x00);
}

pub struct Protocol1_9To1_8;

impl ProtocolProvider for Protocol1_9To1_8 {
    fn server_version(&self) -> ProtocolVersion {
        ProtocolVersion::V1_8
    }

    fn client_version(&self) -> ProtocolVersion {
        ProtocolVersion::V1_9
    }

    fn build(&self, mappings: Arc<MappingData>) -> Result<ProtocolDefinition, DefinitionError> {
        let registry = Arc::new(entity_registry()?);
        let index = Arc::new(metadata_index(registry.clone())?);
        let old = Arc::new(legacy_metadata());
        let new = Arc::new(metadata_1_9());

        let mut builder = ProtocolDefinition::builder(self.server_version(), self.client_version());
        builder
            .entity_types(registry)
            .metadata_index(index)
            .mappings(mappings);

        let (id, mapped) = clientbound::JOIN_GAME;
        builder.register_clientbound(PLAY, id, mapped, |w| {
            let entity_id = w.passthrough(Int)?;
            w.session().tracker.set_player(entity_id, EntityType1_8::Player.id());
            Ok(())
        });

        let (id, mapped) = clientbound::SPAWN_OBJECT;
        builder.register_clientbound(PLAY, id, mapped, spawn_object);

        let (id, mapped) = clientbound::SPAWN_MOB;
        let (mob_old, mob_new) = (old.clone(), new.clone());
        builder.register_clientbound(PLAY, id, mapped, move |w| spawn_mob(w, &mob_old, &mob_new));

        let (id, mapped) = clientbound::SPAWN_PLAYER;
        let (player_old, player_new) = (old.clone(), new.clone());
        builder.register_clientbound(PLAY, id, mapped, move |w| {
            spawn_player(w, &player_old, &player_new)
        });

        let (id, mapped) = clientbound::DESTROY_ENTITIES;
        builder.register_remove_entities(id, mapped);
        let (id, mapped) = clientbound::ENTITY_METADATA;
        builder.register_metadata_rewriter(id, mapped, old, new);

        for (id, mapped) in [
            clientbound::KEEP_ALIVE,
            clientbound::CHAT,
            clientbound::DISCONNECT,
        ] {
            builder.remap_clientbound(PLAY, id, mapped);
        }
        for (id, mapped) in [serverbound::KEEP_ALIVE, serverbound::CHAT] {
            builder.remap_serverbound(PLAY, id, mapped);
        }
        builder.cancel_serverbound(PLAY, serverbound::TELEPORT_CONFIRM);

        builder.build()
    }
}

/// 1.9 needs an entity uuid where 1.8 sent none. Derived from the entity id
/// so a respawned id gets the same uuid.
fn entity_uuid(entity_id: i32) -> Uuid {
    Uuid::from_u128(entity_id as u32 as u128)
}

/// 1.8 sends positions as fixed-point ints with 5 fractional bits.
fn fixed_point_position(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    for _ in 0..3 {
        let raw = w.read(Int)?;
        w.write(Double, raw as f64 / 32.0);
    }
    Ok(())
}

fn spawn_object(w: &mut PacketWrapper<'_>) -> Result<(), TranslationError> {
    let entity_id = w.passthrough(VarInt)?;
    w.write(UuidType, entity_uuid(entity_id));
    let code = w.passthrough(Byte)? as i32;
    fixed_point_position(w)?;
    w.passthrough(Byte)?;
    w.passthrough(Byte)?;
    let data = w.passthrough(Int)?;
    // Velocity is only present with non-zero data in 1.8, always in 1.9.
    for _ in 0..3 {
        let velocity = if data != 0 { w.read(Short)? } else { 0 };
        w.write(Short, velocity);
    }

    let ty = rewriter::resolve_entity(w, code, true, data)?;
    w.session().tracker.on_spawn(entity_id, ty);
    trace!("Spawned object {} (code {}, data {})", entity_id, code, data);
    Ok(())
}

fn spawn_mob(
    w: &mut PacketWrapper<'_>,
    old: &MetadataListType,
    new: &MetadataListType,
) -> Result<(), TranslationError> {
    let entity_id = w.passthrough(VarInt)?;
    w.write(UuidType, entity_uuid(entity_id));
    let code = w.passthrough(UnsignedByte)? as i32;
    fixed_point_position(w)?;
    // Yaw, pitch, head pitch.
    for _ in 0..3 {
        w.passthrough(Byte)?;
    }
    for _ in 0..3 {
        w.passthrough(Short)?;
    }

    let ty = rewriter::resolve_entity(w, code, false, 0)?;
    w.session().tracker.on_spawn(entity_id, ty);
    let entries = w.read(old)?;
    let rewritten = rewriter::rewrite_metadata(w, entity_id, entries, old, new);
    w.write(new, rewritten);
    Ok(())
}

fn spawn_player(
    w: &mut PacketWrapper<'_>,
    old: &MetadataListType,
    new: &MetadataListType,
) -> Result<(), TranslationError> {
    let entity_id = w.passthrough(VarInt)?;
    w.passthrough(UuidType)?;
    fixed_point_position(w)?;
    w.passthrough(Byte)?;
    w.passthrough(Byte)?;
    // Held item moved to the equipment packet.
    w.read(Short)?;

    w.session().tracker.on_spawn(entity_id, EntityType1_8::Player.id());
    let entries = w.read(old)?;
    let rewritten = rewriter::rewrite_metadata(w, entity_id, entries, old, new);
    w.write(new, rewritten);
    Ok(())
}
