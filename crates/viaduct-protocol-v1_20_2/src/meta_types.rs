use std::sync::Arc;
use viaduct_data::MappingData;
use viaduct_protocol_core::{MetaKind, MetadataFraming, MetadataListType, ParticleRegistry};

/// Type ids 0..=27, shared by 1.19.4 through 1.20.2. Only the item and NBT
/// encodings differ.
fn kinds(item: MetaKind, nbt: MetaKind) -> Vec<MetaKind> {
    vec![
        MetaKind::Byte,
        MetaKind::VarInt,
        MetaKind::VarLong,
        MetaKind::Float,
        MetaKind::String,
        MetaKind::Component,
        MetaKind::OptComponent,
        item,
        MetaKind::Boolean,
        MetaKind::Rotation,
        MetaKind::Position,
        MetaKind::OptPosition,
        // Direction
        MetaKind::VarInt,
        MetaKind::OptUuid,
        MetaKind::BlockState,
        MetaKind::OptBlockState,
        nbt,
        MetaKind::Particle,
        MetaKind::VillagerData,
        MetaKind::OptVarInt,
        // Pose, cat variant, frog variant
        MetaKind::VarInt,
        MetaKind::VarInt,
        MetaKind::VarInt,
        MetaKind::OptGlobalPosition,
        // Painting variant, sniffer state
        MetaKind::VarInt,
        MetaKind::VarInt,
        MetaKind::Vector3f,
        MetaKind::Quaternion,
    ]
}

fn particles(mappings: &MappingData) -> Arc<ParticleRegistry> {
    Arc::new(ParticleRegistry::from_identifiers(&mappings.particles))
}

pub fn metadata_1_20(mappings: &MappingData) -> MetadataListType {
    MetadataListType::new(MetadataFraming::Modern, kinds(MetaKind::Item, MetaKind::Nbt))
        .with_particles(particles(mappings))
}

pub fn metadata_1_20_2(mappings: &MappingData) -> MetadataListType {
    MetadataListType::new(
        MetadataFraming::Modern,
        kinds(MetaKind::NamelessItem, MetaKind::NamelessNbt),
    )
    .with_particles(particles(mappings))
}
