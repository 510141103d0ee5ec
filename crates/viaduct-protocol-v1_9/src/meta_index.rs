use crate::entity_types::EntityType1_8 as E;
use crate::meta_types::{legacy as old, v1_9 as new};
use std::sync::Arc;
use viaduct_protocol_core::{
    EntityTypeRegistry, MetadataIndexDescriptor, MetadataIndexTable, RegistryError,
};

/// `(owner, 1.8 index, 1.8 type, 1.9 index, 1.9 type)`. A `None` type means
/// the field has no 1.9 counterpart.
type Row = (E, u8, i32, u8, Option<i32>);

#[rustfmt::skip]
const FIELDS: &[Row] = &[
    (E::Entity, 0, old::BYTE, 0, Some(new::BYTE)),
    (E::Entity, 1, old::SHORT, 1, Some(new::VAR_INT)),
    (E::Entity, 2, old::STRING, 2, Some(new::STRING)),
    (E::Entity, 3, old::BYTE, 3, Some(new::BOOLEAN)),
    (E::Entity, 4, old::BYTE, 4, Some(new::BOOLEAN)),
    (E::LivingBase, 6, old::FLOAT, 6, Some(new::FLOAT)),
    (E::LivingBase, 7, old::INT, 7, Some(new::VAR_INT)),
    (E::LivingBase, 8, old::BYTE, 8, Some(new::BOOLEAN)),
    (E::LivingBase, 9, old::BYTE, 9, Some(new::VAR_INT)),
    (E::Living, 15, old::BYTE, 10, Some(new::BYTE)),
    (E::Ageable, 12, old::BYTE, 11, Some(new::BOOLEAN)),
    (E::Horse, 16, old::INT, 12, Some(new::BYTE)),
    (E::Horse, 19, old::BYTE, 13, Some(new::VAR_INT)),
    (E::Horse, 20, old::INT, 14, Some(new::VAR_INT)),
    (E::Horse, 21, old::STRING, 15, Some(new::OPT_UUID)),
    (E::Horse, 22, old::INT, 16, Some(new::VAR_INT)),
    (E::Rabbit, 18, old::BYTE, 12, Some(new::VAR_INT)),
    (E::Tameable, 16, old::BYTE, 12, Some(new::BYTE)),
    (E::Tameable, 17, old::STRING, 13, Some(new::OPT_UUID)),
    (E::Wolf, 18, old::FLOAT, 14, Some(new::FLOAT)),
    (E::Wolf, 19, old::BYTE, 15, Some(new::BOOLEAN)),
    (E::Wolf, 20, old::BYTE, 16, Some(new::VAR_INT)),
    (E::Ocelot, 18, old::BYTE, 14, Some(new::VAR_INT)),
    (E::Pig, 16, old::BYTE, 12, Some(new::BOOLEAN)),
    (E::Sheep, 16, old::BYTE, 12, Some(new::BYTE)),
    (E::Villager, 16, old::INT, 12, Some(new::VAR_INT)),
    (E::Guardian, 16, old::INT, 11, Some(new::BYTE)),
    (E::Guardian, 17, old::INT, 12, Some(new::VAR_INT)),
    (E::Zombie, 12, old::BYTE, 11, Some(new::BOOLEAN)),
    (E::Zombie, 13, old::BYTE, 12, Some(new::VAR_INT)),
    (E::Zombie, 14, old::BYTE, 13, Some(new::BOOLEAN)),
    // The carried block is split over two 1.8 fields.
    (E::Enderman, 16, old::SHORT, 11, None),
    (E::Enderman, 17, old::BYTE, 11, None),
    (E::Enderman, 18, old::BYTE, 12, Some(new::BOOLEAN)),
    (E::Spider, 16, old::BYTE, 11, Some(new::BYTE)),
    (E::Creeper, 16, old::BYTE, 11, Some(new::VAR_INT)),
    (E::Creeper, 17, old::BYTE, 12, Some(new::BOOLEAN)),
    (E::Creeper, 18, old::BYTE, 13, Some(new::BOOLEAN)),
    (E::Skeleton, 13, old::BYTE, 11, Some(new::VAR_INT)),
    (E::Witch, 21, old::BYTE, 11, Some(new::BOOLEAN)),
    (E::Blaze, 16, old::BYTE, 11, Some(new::BYTE)),
    (E::Wither, 17, old::INT, 11, Some(new::VAR_INT)),
    (E::Wither, 18, old::INT, 12, Some(new::VAR_INT)),
    (E::Wither, 19, old::INT, 13, Some(new::VAR_INT)),
    (E::Wither, 20, old::INT, 14, Some(new::VAR_INT)),
    (E::IronGolem, 16, old::BYTE, 11, Some(new::BYTE)),
    (E::Slime, 16, old::BYTE, 11, Some(new::VAR_INT)),
    (E::Bat, 16, old::BYTE, 11, Some(new::BYTE)),
    (E::Ghast, 16, old::BYTE, 11, Some(new::BOOLEAN)),
    (E::ArmorStand, 10, old::BYTE, 10, Some(new::BYTE)),
    (E::ArmorStand, 11, old::ROTATION, 11, Some(new::VECTOR3F)),
    (E::ArmorStand, 12, old::ROTATION, 12, Some(new::VECTOR3F)),
    (E::ArmorStand, 13, old::ROTATION, 13, Some(new::VECTOR3F)),
    (E::ArmorStand, 14, old::ROTATION, 14, Some(new::VECTOR3F)),
    (E::ArmorStand, 15, old::ROTATION, 15, Some(new::VECTOR3F)),
    (E::ArmorStand, 16, old::ROTATION, 16, Some(new::VECTOR3F)),
    (E::Player, 10, old::BYTE, 12, Some(new::BYTE)),
    (E::Player, 16, old::BYTE, 16, None),
    (E::Player, 17, old::FLOAT, 10, Some(new::FLOAT)),
    (E::Player, 18, old::INT, 11, Some(new::VAR_INT)),
    (E::WitherSkull, 10, old::BYTE, 5, Some(new::BOOLEAN)),
    (E::Arrow, 16, old::BYTE, 5, Some(new::BYTE)),
    (E::EnderCrystal, 8, old::INT, 8, None),
    (E::Firework, 8, old::SLOT, 5, Some(new::SLOT)),
    (E::Boat, 17, old::INT, 5, Some(new::VAR_INT)),
    (E::Boat, 18, old::INT, 6, Some(new::VAR_INT)),
    (E::Boat, 19, old::FLOAT, 7, Some(new::FLOAT)),
    (E::Item, 10, old::SLOT, 5, Some(new::SLOT)),
    (E::MinecartAbstract, 17, old::INT, 5, Some(new::VAR_INT)),
    (E::MinecartAbstract, 18, old::INT, 6, Some(new::VAR_INT)),
    (E::MinecartAbstract, 19, old::FLOAT, 7, Some(new::FLOAT)),
    (E::MinecartAbstract, 20, old::INT, 8, Some(new::VAR_INT)),
    (E::MinecartAbstract, 21, old::INT, 9, Some(new::VAR_INT)),
    (E::MinecartAbstract, 22, old::BYTE, 10, Some(new::BOOLEAN)),
    (E::MinecartCommandBlock, 23, old::STRING, 11, Some(new::STRING)),
    (E::MinecartCommandBlock, 24, old::STRING, 12, Some(new::CHAT)),
    (E::MinecartFurnace, 16, old::BYTE, 11, Some(new::BOOLEAN)),
    (E::ItemFrame, 8, old::SLOT, 5, Some(new::SLOT)),
    (E::ItemFrame, 9, old::BYTE, 6, Some(new::VAR_INT)),
];

pub fn metadata_index(
    registry: Arc<EntityTypeRegistry>,
) -> Result<MetadataIndexTable, RegistryError> {
    let descriptors = FIELDS
        .iter()
        .map(|&(owner, index, old_type, new_index, new_type)| {
            MetadataIndexDescriptor::new(owner.id(), index, old_type, new_type).moved_to(new_index)
        });
    MetadataIndexTable::build(registry, descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_types::entity_registry;

    fn table() -> MetadataIndexTable {
        metadata_index(Arc::new(entity_registry().unwrap())).unwrap()
    }

    #[test]
    fn test_table_has_no_duplicates() {
        assert_eq!(table().len(), FIELDS.len());
    }

    #[test]
    fn test_zombie_child_flag_moves() {
        let table = table();
        let found = table.find_descriptor(E::PigZombie.id(), 12).unwrap();
        assert_eq!(found.owner, E::Zombie.id());
        assert_eq!((found.new_index, found.new_type), (11, Some(new::BOOLEAN)));
    }

    #[test]
    fn test_shared_fields_come_from_ancestors() {
        let table = table();
        let health = table.find_descriptor(E::Creeper.id(), 6).unwrap();
        assert_eq!(health.owner, E::LivingBase.id());
        let flags = table.find_descriptor(E::Boat.id(), 0).unwrap();
        assert_eq!(flags.owner, E::Entity.id());
        assert!(table.find_descriptor(E::Boat.id(), 6).is_none());
    }

    #[test]
    fn test_fields_without_counterpart_are_drops() {
        let table = table();
        let drops = [
            (E::Enderman, 16),
            (E::Enderman, 17),
            (E::Player, 16),
            (E::EnderCrystal, 8),
        ];
        for (owner, index) in drops {
            let found = table.find_descriptor(owner.id(), index).unwrap();
            assert_eq!(found.owner, owner.id());
            assert_eq!(found.new_type, None);
        }
        let owner = table.find_descriptor(E::Wolf.id(), 17).unwrap();
        assert_eq!(owner.owner, E::Tameable.id());
        assert_eq!((owner.new_index, owner.new_type), (13, Some(new::OPT_UUID)));
    }
}
