use crate::codec::{read_string, read_varint, write_string, write_varint, MAX_STRING_LEN};
use crate::error::{PipelineError, TranslationError};
use crate::protocol::ProtocolDefinition;
use crate::session::{Session, SessionStats};
use crate::types::{NamelessNbt, UnsignedShort, WireType};
use crate::wrapper::RawPacket;
use crate::{ConnectionState, Direction, ProtocolVersion};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use tracing::{debug, warn};
use viaduct_nbt::NbtValue;
use viaduct_types::TextComponent;

/// Version and phase of one transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkState {
    pub version: ProtocolVersion,
    pub phase: ConnectionState,
}

impl LinkState {
    fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            phase: ConnectionState::Handshaking,
        }
    }

    /// Applies the phase change a packet crossing this link implies.
    fn observe(&mut self, direction: Direction, packet: &RawPacket) {
        let version = self.version;
        let next = match (direction, packet.phase) {
            (Direction::Clientbound, ConnectionState::Login)
                if packet.id == version.login_success_id()
                    && !version.has_configuration_phase() =>
            {
                Some(ConnectionState::Play)
            }
            (Direction::Serverbound, ConnectionState::Login)
                if Some(packet.id) == version.login_ack_id() =>
            {
                Some(ConnectionState::Configuration)
            }
            (Direction::Serverbound, ConnectionState::Configuration)
                if Some(packet.id) == version.finish_configuration_ack_id() =>
            {
                Some(ConnectionState::Play)
            }
            (Direction::Serverbound, ConnectionState::Play)
                if Some(packet.id) == version.configuration_ack_id() =>
            {
                Some(ConnectionState::Configuration)
            }
            _ => None,
        };
        if let Some(next) = next {
            if next != self.phase {
                debug!("{} link {:?} -> {:?}", version, self.phase, next);
            }
            self.phase = next;
        }
    }
}

struct Stage {
    definition: Arc<ProtocolDefinition>,
    session: Session,
}

/// Per connection chain of protocol definitions, server side first.
pub struct ConnectionPipeline {
    stages: Vec<Stage>,
    client: LinkState,
    server: LinkState,
}

impl ConnectionPipeline {
    pub fn new(
        client_version: ProtocolVersion,
        server_version: ProtocolVersion,
        path: Vec<Arc<ProtocolDefinition>>,
    ) -> Self {
        let stages = path
            .into_iter()
            .map(|definition| Stage {
                definition,
                session: Session::new(),
            })
            .collect();
        Self {
            stages,
            client: LinkState::new(client_version),
            server: LinkState::new(server_version),
        }
    }

    pub fn client_link(&self) -> LinkState {
        self.client
    }

    pub fn server_link(&self) -> LinkState {
        self.server
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Session of the `index`th stage, counted from the server side.
    pub fn session(&self, index: usize) -> Option<&Session> {
        self.stages.get(index).map(|stage| &stage.session)
    }

    pub fn stats(&self) -> SessionStats {
        let mut total = SessionStats::default();
        for stage in &self.stages {
            total.merge(&stage.session.stats);
        }
        total
    }

    /// Translates a packet from the client into packets for the server.
    pub fn handle_serverbound(
        &mut self,
        id: i32,
        payload: Bytes,
    ) -> Result<Vec<RawPacket>, PipelineError> {
        let phase = self.client.phase;
        let wrap = |source| PipelineError {
            direction: Direction::Serverbound,
            phase,
            packet_id: id,
            source,
        };
        let mut packet = RawPacket::new(id, phase, payload);
        if phase == ConnectionState::Handshaking && id == 0x00 {
            packet = self.rewrite_handshake(packet).map_err(wrap)?;
        }
        self.client.observe(Direction::Serverbound, &packet);

        let mut packets = vec![packet];
        for stage in self.stages.iter_mut().rev() {
            packets = run_stage(stage, Direction::Serverbound, packets).map_err(wrap)?;
        }
        for packet in &packets {
            self.server.observe(Direction::Serverbound, packet);
        }
        Ok(packets)
    }

    /// Translates a packet from the server into packets for the client.
    pub fn handle_clientbound(
        &mut self,
        id: i32,
        payload: Bytes,
    ) -> Result<Vec<RawPacket>, PipelineError> {
        let phase = self.server.phase;
        let wrap = |source| PipelineError {
            direction: Direction::Clientbound,
            phase,
            packet_id: id,
            source,
        };
        let mut packet = RawPacket::new(id, phase, payload);
        self.server.observe(Direction::Clientbound, &packet);
        if phase == ConnectionState::Status && id == 0x00 {
            packet = self.rewrite_status(packet).map_err(wrap)?;
        }

        let mut packets = vec![packet];
        for stage in self.stages.iter_mut() {
            packets = run_stage(stage, Direction::Clientbound, packets).map_err(wrap)?;
        }
        for packet in &packets {
            self.client.observe(Direction::Clientbound, packet);
        }
        Ok(packets)
    }

    /// Handshake: the protocol field becomes the server's version and both
    /// links follow the requested next state.
    fn rewrite_handshake(&mut self, packet: RawPacket) -> Result<RawPacket, TranslationError> {
        let mut input = packet.payload;
        let client_protocol = read_varint(&mut input)?;
        let address = read_string(&mut input, 255)?;
        let port = UnsignedShort.read(&mut input)?;
        let next = read_varint(&mut input)?;
        if client_protocol != self.client.version.id() {
            warn!(
                "Handshake announces protocol {} on a pipeline built for {}",
                client_protocol, self.client.version
            );
        }
        let next_phase = ConnectionState::from_handshake_next(next).ok_or(
            crate::CodecError::InvalidDiscriminant {
                what: "handshake next state",
                value: next,
            },
        )?;
        self.client.phase = next_phase;
        self.server.phase = next_phase;

        let mut out = BytesMut::new();
        write_varint(&mut out, self.server.version.id());
        write_string(&mut out, &address);
        UnsignedShort.write(&mut out, &port);
        write_varint(&mut out, next);
        out.extend_from_slice(&input);
        Ok(RawPacket::new(packet.id, packet.phase, out.freeze()))
    }

    /// Status response: the reported protocol number becomes the client's.
    fn rewrite_status(&self, packet: RawPacket) -> Result<RawPacket, TranslationError> {
        let mut input = packet.payload;
        let json = read_string(&mut input, MAX_STRING_LEN)?;
        let mut status: serde_json::Value = serde_json::from_str(&json)
            .map_err(|e| TranslationError::Custom(format!("invalid status json: {}", e)))?;
        if let Some(version) = status.get_mut("version").and_then(|v| v.as_object_mut()) {
            version.insert(
                "protocol".to_string(),
                serde_json::Value::from(self.client.version.id()),
            );
        }
        let mut out = BytesMut::new();
        write_string(&mut out, &status.to_string());
        Ok(RawPacket::new(packet.id, packet.phase, out.freeze()))
    }

    /// A disconnect packet the client understands in its current phase.
    pub fn disconnect_packet(&self, reason: &str) -> Option<RawPacket> {
        let LinkState { version, phase } = self.client;
        let id = version.disconnect_id(phase)?;
        let text = TextComponent::plain(reason);
        let mut payload = BytesMut::new();
        if phase != ConnectionState::Login && version.uses_nbt_text() {
            let tag = NbtValue::Compound(vec![("text".to_string(), NbtValue::String(text.text))]);
            NamelessNbt.write(&mut payload, &Some(tag));
        } else {
            write_string(&mut payload, &text.to_json());
        }
        Some(RawPacket::new(id, phase, payload.freeze()))
    }

    /// Drops every stage's per connection state.
    pub fn close(&mut self) {
        for stage in &mut self.stages {
            stage.session.clear();
        }
    }
}

fn run_stage(
    stage: &mut Stage,
    direction: Direction,
    packets: Vec<RawPacket>,
) -> Result<Vec<RawPacket>, TranslationError> {
    let mut out = Vec::with_capacity(packets.len());
    for packet in packets {
        out.extend(stage.definition.translate(direction, packet, &mut stage.session)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Str, VarInt};

    fn handshake(protocol: i32, next: i32) -> Bytes {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, protocol);
        write_string(&mut buf, "localhost");
        UnsignedShort.write(&mut buf, &25565);
        write_varint(&mut buf, next);
        buf.freeze()
    }

    fn bridge_definition() -> Arc<ProtocolDefinition> {
        let mut b = ProtocolDefinition::builder(ProtocolVersion::V1_20, ProtocolVersion::V1_20_2);
        b.cancel_serverbound(ConnectionState::Login, 0x03)
            .cancel_serverbound(ConnectionState::Configuration, 0x02)
            .remap_serverbound(ConnectionState::Configuration, 0x03, 0x12);
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn test_handshake_protocol_rewritten() {
        let mut pipeline = ConnectionPipeline::new(
            ProtocolVersion::V1_20_2,
            ProtocolVersion::V1_20,
            vec![bridge_definition()],
        );
        let out = pipeline
            .handle_serverbound(0x00, handshake(764, 2))
            .unwrap();
        assert_eq!(out[0].payload, handshake(763, 2));
        assert_eq!(pipeline.client_link().phase, ConnectionState::Login);
        assert_eq!(pipeline.server_link().phase, ConnectionState::Login);
    }

    #[test]
    fn test_bad_next_state_is_error() {
        let mut pipeline =
            ConnectionPipeline::new(ProtocolVersion::V1_20, ProtocolVersion::V1_20, Vec::new());
        let err = pipeline.handle_serverbound(0x00, handshake(763, 9)).unwrap_err();
        assert_eq!(err.direction, Direction::Serverbound);
        assert_eq!(err.phase, ConnectionState::Handshaking);
    }

    #[test]
    fn test_status_protocol_rewritten() {
        let mut pipeline = ConnectionPipeline::new(
            ProtocolVersion::V1_20_2,
            ProtocolVersion::V1_20,
            vec![bridge_definition()],
        );
        pipeline.handle_serverbound(0x00, handshake(764, 1)).unwrap();
        let mut body = BytesMut::new();
        write_string(
            &mut body,
            r#"{"version":{"name":"1.20","protocol":763},"players":{"max":5,"online":0}}"#,
        );
        let out = pipeline.handle_clientbound(0x00, body.freeze()).unwrap();
        let json = Str.read(&mut out[0].payload.clone()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"]["protocol"], 764);
        assert_eq!(value["players"]["max"], 5);
    }

    #[test]
    fn test_phase_tracking_across_configuration_bridge() {
        let mut pipeline = ConnectionPipeline::new(
            ProtocolVersion::V1_20_2,
            ProtocolVersion::V1_20,
            vec![bridge_definition()],
        );
        pipeline.handle_serverbound(0x00, handshake(764, 2)).unwrap();

        // Login success: the 1.20 server goes straight to play.
        pipeline.handle_clientbound(0x02, Bytes::new()).unwrap();
        assert_eq!(pipeline.server_link().phase, ConnectionState::Play);
        assert_eq!(pipeline.client_link().phase, ConnectionState::Login);

        // Login acknowledged never reaches the server.
        let out = pipeline.handle_serverbound(0x03, Bytes::new()).unwrap();
        assert!(out.is_empty());
        assert_eq!(pipeline.client_link().phase, ConnectionState::Configuration);

        // A configuration keep alive is bridged into play.
        let mut keep_alive = BytesMut::new();
        VarInt.write(&mut keep_alive, &7);
        let out = pipeline
            .handle_serverbound(0x03, keep_alive.freeze())
            .unwrap();
        assert_eq!(out[0].id, 0x12);

        let out = pipeline.handle_serverbound(0x02, Bytes::new()).unwrap();
        assert!(out.is_empty());
        assert_eq!(pipeline.client_link().phase, ConnectionState::Play);
    }

    #[test]
    fn test_disconnect_packet_per_phase() {
        let mut pipeline =
            ConnectionPipeline::new(ProtocolVersion::V1_20_5, ProtocolVersion::V1_20_5, Vec::new());
        assert!(pipeline.disconnect_packet("bye").is_none());
        pipeline.handle_serverbound(0x00, handshake(766, 2)).unwrap();
        let login = pipeline.disconnect_packet("bye").unwrap();
        assert_eq!(login.id, 0x00);
        assert_eq!(
            Str.read(&mut login.payload.clone()).unwrap(),
            r#"{"text":"bye"}"#
        );

        pipeline.handle_serverbound(0x03, Bytes::new()).unwrap();
        let config = pipeline.disconnect_packet("bye").unwrap();
        assert_eq!(config.id, 0x02);
        let tag = NamelessNbt.read(&mut config.payload.clone()).unwrap().unwrap();
        assert_eq!(tag.get("text").and_then(NbtValue::as_str), Some("bye"));
    }

    #[test]
    fn test_close_clears_sessions() {
        let mut pipeline = ConnectionPipeline::new(
            ProtocolVersion::V1_20_2,
            ProtocolVersion::V1_20,
            vec![bridge_definition()],
        );
        pipeline.stages[0]
            .session
            .tracker
            .on_spawn(1, crate::EntityTypeId(0));
        pipeline.close();
        assert!(pipeline.session(0).unwrap().tracker.is_empty());
    }
}
