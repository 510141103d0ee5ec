//! 1.20.3 servers to 1.20.5 clients: registries are sent one packet per
//! registry and item stacks carry typed components instead of a tag.

mod packets;
mod protocol;
mod structured_data;

pub use protocol::Protocol1_20_5To1_20_3;
pub use structured_data::{ComponentItem, ComponentItemType, StructuredData, StructuredDataSchema};
