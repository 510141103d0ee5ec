use viaduct_protocol_core::{MetaKind, MetadataFraming, MetadataListType};

pub(crate) mod legacy {
    pub const BYTE: i32 = 0;
    pub const SHORT: i32 = 1;
    pub const INT: i32 = 2;
    pub const FLOAT: i32 = 3;
    pub const STRING: i32 = 4;
    pub const SLOT: i32 = 5;
    pub const POSITION: i32 = 6;
    pub const ROTATION: i32 = 7;
}

pub(crate) mod v1_9 {
    pub const BYTE: i32 = 0;
    pub const VAR_INT: i32 = 1;
    pub const FLOAT: i32 = 2;
    pub const STRING: i32 = 3;
    pub const CHAT: i32 = 4;
    pub const SLOT: i32 = 5;
    pub const BOOLEAN: i32 = 6;
    pub const VECTOR3F: i32 = 7;
    pub const POSITION: i32 = 8;
    pub const OPT_POSITION: i32 = 9;
    pub const DIRECTION: i32 = 10;
    pub const OPT_UUID: i32 = 11;
    pub const BLOCK_ID: i32 = 12;
}

/// 1.8 metadata: header byte framing, eight types.
pub fn legacy_metadata() -> MetadataListType {
    MetadataListType::new(
        MetadataFraming::Legacy,
        vec![
            MetaKind::Byte,
            MetaKind::Short,
            MetaKind::Int,
            MetaKind::Float,
            MetaKind::String,
            MetaKind::LegacyItem,
            MetaKind::IntPosition,
            MetaKind::Rotation,
        ],
    )
}

pub fn metadata_1_9() -> MetadataListType {
    MetadataListType::new(
        MetadataFraming::Modern,
        vec![
            MetaKind::Byte,
            MetaKind::VarInt,
            MetaKind::Float,
            MetaKind::String,
            MetaKind::Component,
            MetaKind::LegacyItem,
            MetaKind::Boolean,
            MetaKind::Vector3f,
            MetaKind::LegacyPosition,
            MetaKind::OptLegacyPosition,
            MetaKind::VarInt,
            MetaKind::OptUuid,
            MetaKind::OptBlockState,
        ],
    )
}
