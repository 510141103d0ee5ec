//! 1.8 servers to 1.9 clients.

mod entity_types;
mod meta_index;
mod meta_types;
mod protocol;

pub use entity_types::{entity_registry, EntityType1_8};
pub use meta_index::metadata_index;
pub use meta_types::{legacy_metadata, metadata_1_9};
pub use protocol::Protocol1_9To1_8;
