use crate::{CodecError, ConnectionState, Direction};
use thiserror::Error;

/// Errors raised while translating a single packet.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("unknown entity type code {code} (object: {is_object}, data: {data})")]
    UnknownEntityType { code: i32, is_object: bool, data: i32 },
    #[error("malformed packet: {0}")]
    MalformedPacket(#[from] CodecError),
    #[error("no metadata mapping for index {index} on {entity}")]
    UnmappedMetadataField { entity: &'static str, index: u8 },
    #[error("packet 0x{packet_id:02X} cannot be translated: {reason}")]
    UnsupportedTranslation { packet_id: i32, reason: &'static str },
    #[error("{0} requires data from an earlier packet that never arrived")]
    MissingState(&'static str),
    #[error("{0}")]
    Custom(String),
}

impl From<viaduct_nbt::NbtError> for TranslationError {
    fn from(err: viaduct_nbt::NbtError) -> Self {
        TranslationError::MalformedPacket(CodecError::Nbt(err))
    }
}

/// A translation failure with the packet it happened on.
#[derive(Debug, Error)]
#[error("{direction} {phase:?} packet 0x{packet_id:02X}: {source}")]
pub struct PipelineError {
    pub direction: Direction,
    pub phase: ConnectionState,
    pub packet_id: i32,
    #[source]
    pub source: TranslationError,
}

/// Invalid registrations found while building a protocol definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("{direction} {phase:?} packet 0x{packet_id:02X} registered twice")]
    DuplicateRegistration {
        direction: Direction,
        phase: ConnectionState,
        packet_id: i32,
    },
    #[error("clientbound packet 0x{0:02X} registered in the handshaking phase")]
    ClientboundHandshake(i32),
    #[error("packet 0x{0:02X} uses entity tracking but no entity types were given")]
    MissingEntityTypes(i32),
    #[error("entity registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Invalid entity taxonomy or metadata table declarations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{child} declares parent #{parent} which is not declared before it")]
    ParentNotDeclared { child: &'static str, parent: u16 },
    #[error("{0} is not the first declaration but has no parent")]
    SecondRoot(&'static str),
    #[error("declaration #{index} is {found}, expected {expected}")]
    OutOfOrder {
        index: usize,
        found: &'static str,
        expected: &'static str,
    },
    #[error("wire code {code} used by both {first} and {second}")]
    DuplicateCode {
        code: i32,
        first: &'static str,
        second: &'static str,
    },
    #[error("identifier {0} declared twice")]
    DuplicateIdentifier(&'static str),
    #[error("object ({code}, {data}) registered twice")]
    DuplicateObject { code: i32, data: i32 },
    #[error("metadata index {index} on {entity} declared twice")]
    DuplicateDescriptor { entity: &'static str, index: u8 },
    #[error("empty entity taxonomy")]
    Empty,
}
