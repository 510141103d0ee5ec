use crate::error::TranslationError;
use crate::protocol::ProtocolDefinition;
use crate::session::Session;
use crate::types::WireType;
use crate::{ConnectionState, Direction};
use bytes::{Bytes, BytesMut};

/// A packet without its length prefix: id, phase tag and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub id: i32,
    pub phase: ConnectionState,
    pub payload: Bytes,
}

impl RawPacket {
    pub fn new(id: i32, phase: ConnectionState, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            phase,
            payload: payload.into(),
        }
    }
}

/// An outbound packet under construction.
#[derive(Debug)]
pub struct PacketBuilder {
    id: i32,
    buf: BytesMut,
}

impl PacketBuilder {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            buf: BytesMut::new(),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn write<T: WireType>(&mut self, ty: T, value: T::Value) -> &mut Self {
        ty.write(&mut self.buf, &value);
        self
    }

    pub fn write_ref<T: WireType>(&mut self, ty: T, value: &T::Value) -> &mut Self {
        ty.write(&mut self.buf, value);
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn finish(self, phase: ConnectionState) -> RawPacket {
        RawPacket::new(self.id, phase, self.buf.freeze())
    }
}

/// Cursor over one packet while a handler rewrites it.
///
/// Whatever the handler has not read when it returns is copied to the output
/// unchanged. Outbound order is: packets emitted with [`send`](Self::send) or
/// [`send_current`](Self::send_current) in call order, then the original
/// packet unless cancelled, then any scheduled packets not yet released.
pub struct PacketWrapper<'a> {
    id: i32,
    phase: ConnectionState,
    direction: Direction,
    input: Bytes,
    output: BytesMut,
    cancelled: bool,
    forwarded: bool,
    emitted: Vec<RawPacket>,
    pending: Vec<RawPacket>,
    session: &'a mut Session,
    definition: &'a ProtocolDefinition,
}

impl<'a> PacketWrapper<'a> {
    pub fn new(
        direction: Direction,
        packet: RawPacket,
        session: &'a mut Session,
        definition: &'a ProtocolDefinition,
    ) -> Self {
        Self {
            id: packet.id,
            phase: packet.phase,
            direction,
            input: packet.payload,
            output: BytesMut::new(),
            cancelled: false,
            forwarded: false,
            emitted: Vec::new(),
            pending: Vec::new(),
            session,
            definition,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    /// Sets the outbound id of the original packet.
    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub fn phase(&self) -> ConnectionState {
        self.phase
    }

    /// Sets the phase the original packet is tagged with on output.
    pub fn set_phase(&mut self, phase: ConnectionState) {
        self.phase = phase;
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn definition(&self) -> &'a ProtocolDefinition {
        self.definition
    }

    pub fn session(&mut self) -> &mut Session {
        &mut *self.session
    }

    pub fn read<T: WireType>(&mut self, ty: T) -> Result<T::Value, TranslationError> {
        Ok(ty.read(&mut self.input)?)
    }

    pub fn write<T: WireType>(&mut self, ty: T, value: T::Value) {
        ty.write(&mut self.output, &value);
    }

    pub fn write_ref<T: WireType>(&mut self, ty: T, value: &T::Value) {
        ty.write(&mut self.output, value);
    }

    /// Reads a value and copies the exact bytes it occupied to the output.
    pub fn passthrough<T: WireType>(&mut self, ty: T) -> Result<T::Value, TranslationError> {
        let before = self.input.clone();
        let value = ty.read(&mut self.input)?;
        let consumed = before.len() - self.input.len();
        self.output.extend_from_slice(&before[..consumed]);
        Ok(value)
    }

    /// Copies the rest of the input to the output.
    pub fn passthrough_all(&mut self) {
        let rest = std::mem::take(&mut self.input);
        self.output.extend_from_slice(&rest);
    }

    /// Takes the rest of the input without copying it to the output.
    pub fn read_remaining(&mut self) -> Bytes {
        std::mem::take(&mut self.input)
    }

    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Drops whatever has been written to the output so far.
    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    pub fn create(&self, id: i32) -> PacketBuilder {
        PacketBuilder::new(id)
    }

    /// Emits `packet` now, after anything emitted earlier.
    pub fn send(&mut self, packet: PacketBuilder, phase: ConnectionState) {
        self.emit(packet.finish(phase));
    }

    /// Emits `packet` right before the next packet this handler emits, or
    /// after the original if nothing else is emitted.
    pub fn schedule_send(&mut self, packet: PacketBuilder, phase: ConnectionState) {
        self.pending.push(packet.finish(phase));
    }

    /// Emits the original packet here, tagged `phase`, instead of at the end.
    pub fn send_current(&mut self, phase: ConnectionState) {
        self.passthrough_all();
        let payload = std::mem::take(&mut self.output).freeze();
        self.emit(RawPacket::new(self.id, phase, payload));
        self.forwarded = true;
    }

    /// The original packet is not forwarded. Created packets still are.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn emit(&mut self, packet: RawPacket) {
        self.emitted.append(&mut self.pending);
        self.emitted.push(packet);
    }

    pub fn finish(mut self) -> Vec<RawPacket> {
        let mut out = std::mem::take(&mut self.emitted);
        if !self.cancelled && !self.forwarded {
            self.passthrough_all();
            let payload = std::mem::take(&mut self.output).freeze();
            out.push(RawPacket::new(self.id, self.phase, payload));
        }
        out.append(&mut self.pending);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Str, VarInt};

    fn definition() -> ProtocolDefinition {
        ProtocolDefinition::builder(crate::ProtocolVersion::V1_20, crate::ProtocolVersion::V1_20_2)
            .build()
            .unwrap()
    }

    fn payload(values: &[i32]) -> Bytes {
        let mut buf = BytesMut::new();
        for v in values {
            crate::codec::write_varint(&mut buf, *v);
        }
        buf.freeze()
    }

    fn wrap<'a>(
        session: &'a mut Session,
        definition: &'a ProtocolDefinition,
        body: Bytes,
    ) -> PacketWrapper<'a> {
        let packet = RawPacket::new(0x10, ConnectionState::Play, body);
        PacketWrapper::new(Direction::Clientbound, packet, session, definition)
    }

    #[test]
    fn test_unread_input_is_forwarded() {
        let def = definition();
        let mut session = Session::new();
        let body = payload(&[300, 1, 2]);
        let mut wrapper = wrap(&mut session, &def, body.clone());
        assert_eq!(wrapper.passthrough(VarInt).unwrap(), 300);
        let out = wrapper.finish();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].payload, body);
    }

    #[test]
    fn test_read_write_rewrites_field() {
        let def = definition();
        let mut session = Session::new();
        let mut wrapper = wrap(&mut session, &def, payload(&[5, 6]));
        let value = wrapper.read(VarInt).unwrap();
        wrapper.write(VarInt, value * 2);
        wrapper.set_id(0x11);
        let out = wrapper.finish();
        assert_eq!(out[0].id, 0x11);
        assert_eq!(out[0].payload, payload(&[10, 6]));
    }

    #[test]
    fn test_underrun_is_malformed() {
        let def = definition();
        let mut session = Session::new();
        let mut wrapper = wrap(&mut session, &def, Bytes::new());
        assert!(matches!(
            wrapper.read(Str),
            Err(TranslationError::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_fan_out_order_with_cancel() {
        let def = definition();
        let mut session = Session::new();
        let mut wrapper = wrap(&mut session, &def, payload(&[1]));
        let first = wrapper.create(0x20);
        wrapper.send(first, ConnectionState::Play);
        let second = wrapper.create(0x21);
        wrapper.send(second, ConnectionState::Play);
        let third = wrapper.create(0x22);
        wrapper.schedule_send(third, ConnectionState::Play);
        wrapper.cancel();
        let ids: Vec<_> = wrapper.finish().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0x20, 0x21, 0x22]);
    }

    #[test]
    fn test_scheduled_packet_precedes_next_emission() {
        let def = definition();
        let mut session = Session::new();
        let mut wrapper = wrap(&mut session, &def, payload(&[1]));
        let registry = wrapper.create(0x05);
        wrapper.send(registry, ConnectionState::Configuration);
        let features = wrapper.create(0x07);
        wrapper.schedule_send(features, ConnectionState::Configuration);
        let finish = wrapper.create(0x02);
        wrapper.send(finish, ConnectionState::Configuration);
        wrapper.send_current(ConnectionState::Play);
        wrapper.cancel();
        let out = wrapper.finish();
        let ids: Vec<_> = out.iter().map(|p| (p.id, p.phase)).collect();
        assert_eq!(
            ids,
            vec![
                (0x05, ConnectionState::Configuration),
                (0x07, ConnectionState::Configuration),
                (0x02, ConnectionState::Configuration),
                (0x10, ConnectionState::Play),
            ]
        );
        assert_eq!(out[3].payload, payload(&[1]));
    }

    #[test]
    fn test_scheduled_packet_follows_original() {
        let def = definition();
        let mut session = Session::new();
        let mut wrapper = wrap(&mut session, &def, payload(&[1]));
        let extra = wrapper.create(0x30);
        wrapper.schedule_send(extra, ConnectionState::Play);
        let ids: Vec<_> = wrapper.finish().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0x10, 0x30]);
    }
}
