//! 1.20 servers to 1.20.2 clients: login now goes through a configuration
//! phase and network NBT loses its root name.

mod chunk;
mod entity_types;
mod meta_types;
mod packets;
mod protocol;

pub use chunk::{ChunkSection, Palette, PalettedContainer};
pub use entity_types::{entity_registry, EntityType1_19_4};
pub use meta_types::{metadata_1_20, metadata_1_20_2};
pub use protocol::Protocol1_20_2To1_20;
