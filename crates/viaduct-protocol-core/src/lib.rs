pub mod codec;
pub mod connection;
pub mod dimension;
pub mod entity;
pub mod error;
pub mod manager;
pub mod metadata;
pub mod pipeline;
pub mod protocol;
pub mod registry_rewriter;
pub mod rewriter;
pub mod session;
pub mod state;
pub mod tracker;
pub mod types;
pub mod version;
pub mod wrapper;

pub use codec::{CodecError, CodecResult};
pub use connection::Connection;
pub use dimension::{DimensionRegistry, DimensionType, WorldData};
pub use entity::{EntityTypeDecl, EntityTypeId, EntityTypeRegistry, WireCode};
pub use error::{DefinitionError, PipelineError, RegistryError, TranslationError};
pub use manager::ProtocolManager;
pub use metadata::{
    MetaKind, MetaValue, Metadata, MetadataFraming, MetadataIndexDescriptor, MetadataIndexTable,
    MetadataListType, ParticleRegistry,
};
pub use pipeline::{ConnectionPipeline, LinkState};
pub use registry_rewriter::ExtraTag;
pub use protocol::{PacketAction, ProtocolDefinition, ProtocolDefinitionBuilder, ProtocolProvider};
pub use session::{Session, SessionStats};
pub use state::*;
pub use tracker::EntityTracker;
pub use version::ProtocolVersion;
pub use wrapper::{PacketBuilder, PacketWrapper, RawPacket};
