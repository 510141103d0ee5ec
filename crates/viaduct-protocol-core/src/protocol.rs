use crate::entity::{EntityTypeId, EntityTypeRegistry};
use crate::error::{DefinitionError, TranslationError};
use crate::metadata::{MetadataIndexTable, MetadataListType};
use crate::rewriter;
use crate::session::Session;
use crate::wrapper::{PacketWrapper, RawPacket};
use crate::{ConnectionState, Direction, ProtocolVersion};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use viaduct_data::MappingData;

pub type PacketHandler =
    Box<dyn Fn(&mut PacketWrapper<'_>) -> Result<(), TranslationError> + Send + Sync>;

pub enum PacketAction {
    /// Forward with the mapped id only.
    Passthrough,
    Cancel,
    /// The packet has no equivalent; dropped and counted.
    Unsupported(&'static str),
    Handler(PacketHandler),
    /// 1.19+ spawn entity: tracks the entity, `fallback` is used for unknown codes.
    TrackerWithData { fallback: EntityTypeId },
    /// Entity id followed by a metadata list.
    Metadata {
        old: Arc<MetadataListType>,
        new: Arc<MetadataListType>,
    },
    /// Varint array of entity ids.
    RemoveEntities,
}

impl std::fmt::Debug for PacketAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketAction::Passthrough => f.write_str("Passthrough"),
            PacketAction::Cancel => f.write_str("Cancel"),
            PacketAction::Unsupported(reason) => write!(f, "Unsupported({})", reason),
            PacketAction::Handler(_) => f.write_str("Handler"),
            PacketAction::TrackerWithData { fallback } => {
                write!(f, "TrackerWithData({:?})", fallback)
            }
            PacketAction::Metadata { .. } => f.write_str("Metadata"),
            PacketAction::RemoveEntities => f.write_str("RemoveEntities"),
        }
    }
}

#[derive(Debug)]
pub struct Registration {
    pub mapped_id: i32,
    pub action: PacketAction,
}

type Table = HashMap<(ConnectionState, i32), Registration>;

/// One edge of the version graph: how packets change between an older
/// server version and the next client version.
///
/// Clientbound registrations are keyed by server-version ids, serverbound
/// registrations by client-version ids. Unregistered packets pass through.
#[derive(Debug)]
pub struct ProtocolDefinition {
    server_version: ProtocolVersion,
    client_version: ProtocolVersion,
    clientbound: Table,
    serverbound: Table,
    entity_types: Option<Arc<EntityTypeRegistry>>,
    metadata_index: Option<Arc<MetadataIndexTable>>,
    mappings: Arc<MappingData>,
    block_state_data_type: Option<EntityTypeId>,
}

impl ProtocolDefinition {
    pub fn builder(
        server_version: ProtocolVersion,
        client_version: ProtocolVersion,
    ) -> ProtocolDefinitionBuilder {
        ProtocolDefinitionBuilder {
            server_version,
            client_version,
            registrations: Vec::new(),
            entity_types: None,
            metadata_index: None,
            mappings: Arc::new(MappingData::default()),
            block_state_data_type: None,
        }
    }

    pub fn server_version(&self) -> ProtocolVersion {
        self.server_version
    }

    pub fn client_version(&self) -> ProtocolVersion {
        self.client_version
    }

    pub fn entity_types(&self) -> Option<&Arc<EntityTypeRegistry>> {
        self.entity_types.as_ref()
    }

    pub fn metadata_index(&self) -> Option<&Arc<MetadataIndexTable>> {
        self.metadata_index.as_ref()
    }

    pub fn mappings(&self) -> &MappingData {
        &self.mappings
    }

    /// Entity type whose spawn data field is a block state.
    pub fn block_state_data_type(&self) -> Option<EntityTypeId> {
        self.block_state_data_type
    }

    pub fn registration(
        &self,
        direction: Direction,
        phase: ConnectionState,
        id: i32,
    ) -> Option<&Registration> {
        let table = match direction {
            Direction::Clientbound => &self.clientbound,
            Direction::Serverbound => &self.serverbound,
        };
        table.get(&(phase, id))
    }

    /// Runs the registered action for `packet`, keyed by the packet's own phase tag.
    pub fn translate(
        &self,
        direction: Direction,
        packet: RawPacket,
        session: &mut Session,
    ) -> Result<Vec<RawPacket>, TranslationError> {
        let Some(registration) = self.registration(direction, packet.phase, packet.id) else {
            return Ok(vec![packet]);
        };
        trace!(
            "{} {:?} 0x{:02X} -> 0x{:02X} ({:?})",
            direction,
            packet.phase,
            packet.id,
            registration.mapped_id,
            registration.action
        );
        let mapped_id = registration.mapped_id;
        match &registration.action {
            PacketAction::Passthrough => Ok(vec![RawPacket { id: mapped_id, ..packet }]),
            PacketAction::Cancel => Ok(Vec::new()),
            PacketAction::Unsupported(reason) => {
                session.stats.unsupported_packets += 1;
                debug!(
                    "{}",
                    TranslationError::UnsupportedTranslation {
                        packet_id: packet.id,
                        reason: *reason,
                    }
                );
                Ok(Vec::new())
            }
            action => {
                let mut wrapper = PacketWrapper::new(direction, packet, session, self);
                wrapper.set_id(mapped_id);
                match action {
                    PacketAction::Handler(handler) => handler(&mut wrapper)?,
                    PacketAction::TrackerWithData { fallback } => {
                        rewriter::track_spawn_with_data(&mut wrapper, *fallback)?
                    }
                    PacketAction::Metadata { old, new } => {
                        rewriter::rewrite_metadata_packet(&mut wrapper, old, new)?
                    }
                    PacketAction::RemoveEntities => rewriter::remove_entities(&mut wrapper)?,
                    PacketAction::Passthrough
                    | PacketAction::Cancel
                    | PacketAction::Unsupported(_) => {}
                }
                Ok(wrapper.finish())
            }
        }
    }
}

/// Collects registrations; conflicts are reported by [`build`](Self::build).
pub struct ProtocolDefinitionBuilder {
    server_version: ProtocolVersion,
    client_version: ProtocolVersion,
    registrations: Vec<(Direction, ConnectionState, i32, Registration)>,
    entity_types: Option<Arc<EntityTypeRegistry>>,
    metadata_index: Option<Arc<MetadataIndexTable>>,
    mappings: Arc<MappingData>,
    block_state_data_type: Option<EntityTypeId>,
}

impl ProtocolDefinitionBuilder {
    fn push(
        &mut self,
        direction: Direction,
        phase: ConnectionState,
        id: i32,
        mapped_id: i32,
        action: PacketAction,
    ) -> &mut Self {
        self.registrations
            .push((direction, phase, id, Registration { mapped_id, action }));
        self
    }

    pub fn register_clientbound<F>(
        &mut self,
        phase: ConnectionState,
        id: i32,
        mapped_id: i32,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(&mut PacketWrapper<'_>) -> Result<(), TranslationError> + Send + Sync + 'static,
    {
        self.push(
            Direction::Clientbound,
            phase,
            id,
            mapped_id,
            PacketAction::Handler(Box::new(handler)),
        )
    }

    pub fn register_serverbound<F>(
        &mut self,
        phase: ConnectionState,
        id: i32,
        mapped_id: i32,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(&mut PacketWrapper<'_>) -> Result<(), TranslationError> + Send + Sync + 'static,
    {
        self.push(
            Direction::Serverbound,
            phase,
            id,
            mapped_id,
            PacketAction::Handler(Box::new(handler)),
        )
    }

    pub fn remap_clientbound(&mut self, phase: ConnectionState, id: i32, mapped_id: i32) -> &mut Self {
        self.push(Direction::Clientbound, phase, id, mapped_id, PacketAction::Passthrough)
    }

    pub fn remap_serverbound(&mut self, phase: ConnectionState, id: i32, mapped_id: i32) -> &mut Self {
        self.push(Direction::Serverbound, phase, id, mapped_id, PacketAction::Passthrough)
    }

    pub fn cancel_clientbound(&mut self, phase: ConnectionState, id: i32) -> &mut Self {
        self.push(Direction::Clientbound, phase, id, id, PacketAction::Cancel)
    }

    pub fn cancel_serverbound(&mut self, phase: ConnectionState, id: i32) -> &mut Self {
        self.push(Direction::Serverbound, phase, id, id, PacketAction::Cancel)
    }

    pub fn unsupported_clientbound(
        &mut self,
        phase: ConnectionState,
        id: i32,
        reason: &'static str,
    ) -> &mut Self {
        self.push(Direction::Clientbound, phase, id, id, PacketAction::Unsupported(reason))
    }

    pub fn unsupported_serverbound(
        &mut self,
        phase: ConnectionState,
        id: i32,
        reason: &'static str,
    ) -> &mut Self {
        self.push(Direction::Serverbound, phase, id, id, PacketAction::Unsupported(reason))
    }

    /// Clientbound play spawn entity with tracking.
    pub fn register_tracker_with_data(
        &mut self,
        id: i32,
        mapped_id: i32,
        fallback: EntityTypeId,
    ) -> &mut Self {
        self.push(
            Direction::Clientbound,
            ConnectionState::Play,
            id,
            mapped_id,
            PacketAction::TrackerWithData { fallback },
        )
    }

    /// Clientbound play entity metadata.
    pub fn register_metadata_rewriter(
        &mut self,
        id: i32,
        mapped_id: i32,
        old: Arc<MetadataListType>,
        new: Arc<MetadataListType>,
    ) -> &mut Self {
        self.push(
            Direction::Clientbound,
            ConnectionState::Play,
            id,
            mapped_id,
            PacketAction::Metadata { old, new },
        )
    }

    /// Clientbound play remove entities.
    pub fn register_remove_entities(&mut self, id: i32, mapped_id: i32) -> &mut Self {
        self.push(
            Direction::Clientbound,
            ConnectionState::Play,
            id,
            mapped_id,
            PacketAction::RemoveEntities,
        )
    }

    pub fn entity_types(&mut self, registry: Arc<EntityTypeRegistry>) -> &mut Self {
        self.entity_types = Some(registry);
        self
    }

    pub fn metadata_index(&mut self, table: Arc<MetadataIndexTable>) -> &mut Self {
        self.metadata_index = Some(table);
        self
    }

    pub fn mappings(&mut self, mappings: Arc<MappingData>) -> &mut Self {
        self.mappings = mappings;
        self
    }

    pub fn block_state_data_type(&mut self, ty: EntityTypeId) -> &mut Self {
        self.block_state_data_type = Some(ty);
        self
    }

    pub fn build(self) -> Result<ProtocolDefinition, DefinitionError> {
        let mut clientbound = Table::new();
        let mut serverbound = Table::new();
        for (direction, phase, id, registration) in self.registrations {
            if direction == Direction::Clientbound && phase == ConnectionState::Handshaking {
                return Err(DefinitionError::ClientboundHandshake(id));
            }
            let needs_entities = matches!(
                registration.action,
                PacketAction::TrackerWithData { .. }
                    | PacketAction::Metadata { .. }
                    | PacketAction::RemoveEntities
            );
            if needs_entities && self.entity_types.is_none() {
                return Err(DefinitionError::MissingEntityTypes(id));
            }
            let table = match direction {
                Direction::Clientbound => &mut clientbound,
                Direction::Serverbound => &mut serverbound,
            };
            if table.insert((phase, id), registration).is_some() {
                return Err(DefinitionError::DuplicateRegistration {
                    direction,
                    phase,
                    packet_id: id,
                });
            }
        }
        Ok(ProtocolDefinition {
            server_version: self.server_version,
            client_version: self.client_version,
            clientbound,
            serverbound,
            entity_types: self.entity_types,
            metadata_index: self.metadata_index,
            mappings: self.mappings,
            block_state_data_type: self.block_state_data_type,
        })
    }
}

/// Builds the definition of one version pair. Implemented once per version crate.
pub trait ProtocolProvider: Send + Sync {
    fn server_version(&self) -> ProtocolVersion;

    fn client_version(&self) -> ProtocolVersion;

    /// Name of the bundled mapping file, `<server>-to-<client>`.
    fn mapping_name(&self) -> String {
        format!("{}-to-{}", self.server_version().name(), self.client_version().name())
    }

    fn build(&self, mappings: Arc<MappingData>) -> Result<ProtocolDefinition, DefinitionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VarInt;
    use bytes::{Bytes, BytesMut};

    fn builder() -> ProtocolDefinitionBuilder {
        ProtocolDefinition::builder(ProtocolVersion::V1_20, ProtocolVersion::V1_20_2)
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut b = builder();
        b.remap_clientbound(ConnectionState::Play, 0x10, 0x11)
            .cancel_clientbound(ConnectionState::Play, 0x10);
        assert!(matches!(
            b.build(),
            Err(DefinitionError::DuplicateRegistration { packet_id: 0x10, .. })
        ));
    }

    #[test]
    fn test_same_id_in_other_phase_is_distinct() {
        let mut b = builder();
        b.remap_serverbound(ConnectionState::Configuration, 0x00, 0x08)
            .remap_serverbound(ConnectionState::Play, 0x00, 0x00);
        assert!(b.build().is_ok());
    }

    #[test]
    fn test_entity_actions_need_registry() {
        let mut b = builder();
        b.register_remove_entities(0x3E, 0x40);
        assert!(matches!(b.build(), Err(DefinitionError::MissingEntityTypes(0x3E))));
    }

    #[test]
    fn test_clientbound_handshake_rejected() {
        let mut b = builder();
        b.remap_clientbound(ConnectionState::Handshaking, 0x00, 0x00);
        assert!(matches!(b.build(), Err(DefinitionError::ClientboundHandshake(0))));
    }

    #[test]
    fn test_translate_actions() {
        let mut b = builder();
        b.remap_clientbound(ConnectionState::Play, 0x01, 0x02)
            .cancel_clientbound(ConnectionState::Play, 0x03)
            .unsupported_clientbound(ConnectionState::Play, 0x04, "gone")
            .register_clientbound(ConnectionState::Play, 0x05, 0x06, |w| {
                let v = w.read(VarInt)?;
                w.write(VarInt, v + 1);
                Ok(())
            });
        let def = b.build().unwrap();
        let mut session = Session::new();
        let run = |id: i32, session: &mut Session| {
            let packet = RawPacket::new(id, ConnectionState::Play, Bytes::from_static(&[0x07]));
            def.translate(Direction::Clientbound, packet, session).unwrap()
        };

        let out = run(0x01, &mut session);
        assert_eq!((out[0].id, &out[0].payload[..]), (0x02, &[0x07][..]));
        assert!(run(0x03, &mut session).is_empty());
        assert!(run(0x04, &mut session).is_empty());
        assert_eq!(session.stats.unsupported_packets, 1);
        let out = run(0x05, &mut session);
        assert_eq!((out[0].id, &out[0].payload[..]), (0x06, &[0x08][..]));
        let out = run(0x7F, &mut session);
        assert_eq!(out[0].id, 0x7F);
    }

    #[test]
    fn test_lookup_follows_packet_phase_tag() {
        let mut b = builder();
        b.remap_serverbound(ConnectionState::Configuration, 0x03, 0x12);
        let def = b.build().unwrap();
        let mut session = Session::new();
        let mut body = BytesMut::new();
        crate::codec::write_varint(&mut body, 1);
        let body = body.freeze();

        let config = RawPacket::new(0x03, ConnectionState::Configuration, body.clone());
        let out = def.translate(Direction::Serverbound, config, &mut session).unwrap();
        assert_eq!(out[0].id, 0x12);

        let play = RawPacket::new(0x03, ConnectionState::Play, body);
        let out = def.translate(Direction::Serverbound, play, &mut session).unwrap();
        assert_eq!(out[0].id, 0x03);
    }
}
