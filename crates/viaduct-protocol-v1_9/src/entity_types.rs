use viaduct_protocol_core::entity_types;
use viaduct_protocol_core::WireCode::{Abstract, Fixed};
use viaduct_protocol_core::{EntityTypeRegistry, RegistryError};

entity_types! {
    /// 1.8 entity taxonomy. Mob codes are the spawn mob type byte.
    pub enum EntityType1_8 {
        Entity("entity", Abstract),
        FishHook("fishing_bobber", Abstract, Entity),
        EnderEye("eye_of_ender", Fixed(15), Entity),
        Item("item", Fixed(1), Entity),
        MinecartAbstract("abstract_minecart", Abstract, Entity),
        MinecartContainer("abstract_container_minecart", Abstract, MinecartAbstract),
        MinecartChest("chest_minecart", Fixed(43), MinecartContainer),
        MinecartHopper("hopper_minecart", Fixed(46), MinecartContainer),
        MinecartCommandBlock("command_block_minecart", Fixed(40), MinecartAbstract),
        MinecartTnt("tnt_minecart", Fixed(45), MinecartAbstract),
        MinecartSpawner("spawner_minecart", Fixed(47), MinecartAbstract),
        MinecartEmpty("minecart", Fixed(42), MinecartAbstract),
        MinecartFurnace("furnace_minecart", Fixed(44), MinecartAbstract),
        Hanging("hanging", Abstract, Entity),
        ItemFrame("item_frame", Fixed(18), Hanging),
        LeashKnot("leash_knot", Fixed(8), Hanging),
        Painting("painting", Fixed(9), Hanging),
        LivingBase("living_base", Abstract, Entity),
        Player("player", Abstract, LivingBase),
        Living("living", Fixed(48), LivingBase),
        Creature("creature", Abstract, Living),
        Ageable("ageable", Abstract, Creature),
        Animal("animal", Abstract, Ageable),
        Horse("horse", Fixed(100), Animal),
        Cow("cow", Fixed(92), Animal),
        Mooshroom("mooshroom", Fixed(96), Cow),
        Chicken("chicken", Fixed(93), Animal),
        Rabbit("rabbit", Fixed(101), Animal),
        Tameable("tameable", Abstract, Animal),
        Wolf("wolf", Fixed(95), Tameable),
        Ocelot("ocelot", Fixed(98), Tameable),
        Pig("pig", Fixed(90), Animal),
        Sheep("sheep", Fixed(91), Animal),
        Villager("villager", Fixed(120), Ageable),
        Mob("monster", Fixed(49), Creature),
        Guardian("guardian", Fixed(68), Mob),
        Zombie("zombie", Fixed(54), Mob),
        PigZombie("zombie_pigman", Fixed(57), Zombie),
        Enderman("enderman", Fixed(58), Mob),
        Spider("spider", Fixed(52), Mob),
        CaveSpider("cave_spider", Fixed(59), Spider),
        Giant("giant", Fixed(53), Mob),
        Endermite("endermite", Fixed(67), Mob),
        Creeper("creeper", Fixed(50), Mob),
        Silverfish("silverfish", Fixed(60), Mob),
        Skeleton("skeleton", Fixed(51), Mob),
        Witch("witch", Fixed(66), Mob),
        Blaze("blaze", Fixed(61), Mob),
        Wither("wither", Fixed(64), Mob),
        Golem("golem", Abstract, Creature),
        SnowGolem("snow_golem", Fixed(97), Golem),
        IronGolem("iron_golem", Fixed(99), Golem),
        EnderDragon("ender_dragon", Fixed(63), Living),
        Slime("slime", Fixed(55), Living),
        MagmaCube("magma_cube", Fixed(62), Slime),
        WaterMob("water_mob", Abstract, Living),
        Squid("squid", Fixed(94), WaterMob),
        Ambient("ambient", Abstract, Living),
        Bat("bat", Fixed(65), Ambient),
        Flying("flying", Abstract, Living),
        Ghast("ghast", Fixed(56), Flying),
        ArmorStand("armor_stand", Fixed(30), Living),
        Fireball("abstract_fireball", Abstract, Entity),
        LargeFireball("fireball", Fixed(12), Fireball),
        SmallFireball("small_fireball", Fixed(13), Fireball),
        WitherSkull("wither_skull", Fixed(19), Fireball),
        Throwable("throwable", Abstract, Entity),
        Potion("potion", Fixed(16), Throwable),
        Snowball("snowball", Fixed(11), Throwable),
        ExpBottle("experience_bottle", Fixed(17), Throwable),
        EnderPearl("ender_pearl", Fixed(14), Throwable),
        Egg("egg", Fixed(7), Throwable),
        Arrow("arrow", Fixed(10), Entity),
        EnderCrystal("end_crystal", Fixed(200), Entity),
        ExperienceOrb("experience_orb", Fixed(2), Entity),
        Firework("firework_rocket", Fixed(22), Entity),
        FallingBlock("falling_block", Fixed(21), Entity),
        TntPrimed("tnt", Fixed(20), Entity),
        Boat("boat", Fixed(41), Entity),
    }
}

/// Spawn object codes: `(type byte, object data, entity type)`.
/// Minecarts carry their subtype in the object data.
const OBJECTS: &[(i32, i32, EntityType1_8)] = &[
    (1, 0, EntityType1_8::Boat),
    (2, 0, EntityType1_8::Item),
    (10, 0, EntityType1_8::MinecartEmpty),
    (10, 1, EntityType1_8::MinecartChest),
    (10, 2, EntityType1_8::MinecartFurnace),
    (10, 3, EntityType1_8::MinecartTnt),
    (10, 4, EntityType1_8::MinecartSpawner),
    (10, 5, EntityType1_8::MinecartHopper),
    (10, 6, EntityType1_8::MinecartCommandBlock),
    (50, 0, EntityType1_8::TntPrimed),
    (51, 0, EntityType1_8::EnderCrystal),
    (60, 0, EntityType1_8::Arrow),
    (61, 0, EntityType1_8::Snowball),
    (62, 0, EntityType1_8::Egg),
    (63, 0, EntityType1_8::LargeFireball),
    (64, 0, EntityType1_8::SmallFireball),
    (65, 0, EntityType1_8::EnderPearl),
    (66, 0, EntityType1_8::WitherSkull),
    (70, 0, EntityType1_8::FallingBlock),
    (71, 0, EntityType1_8::ItemFrame),
    (72, 0, EntityType1_8::EnderEye),
    (73, 0, EntityType1_8::Potion),
    (75, 0, EntityType1_8::ExpBottle),
    (76, 0, EntityType1_8::Firework),
    (77, 0, EntityType1_8::LeashKnot),
    (78, 0, EntityType1_8::ArmorStand),
    (90, 0, EntityType1_8::FishHook),
];

pub fn entity_registry() -> Result<EntityTypeRegistry, RegistryError> {
    let objects: Vec<_> = OBJECTS
        .iter()
        .map(|&(code, data, ty)| (code, data, ty.id()))
        .collect();
    EntityTypeRegistry::build(EntityType1_8::DECLARATIONS, None)?.with_objects(&objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds() {
        let registry = entity_registry().unwrap();
        assert_eq!(registry.len(), EntityType1_8::DECLARATIONS.len());
        assert_eq!(registry.root(), EntityType1_8::Entity.id());
    }

    #[test]
    fn test_mob_codes() {
        let registry = entity_registry().unwrap();
        assert_eq!(registry.resolve(54, false, 0).unwrap(), EntityType1_8::Zombie.id());
        assert_eq!(registry.resolve(57, false, 0).unwrap(), EntityType1_8::PigZombie.id());
        assert!(registry.is_a(EntityType1_8::PigZombie.id(), EntityType1_8::Mob.id()));
        assert!(registry.is_a(EntityType1_8::Mooshroom.id(), EntityType1_8::Ageable.id()));
    }

    #[test]
    fn test_minecart_subtype_comes_from_object_data() {
        let registry = entity_registry().unwrap();
        assert_eq!(registry.resolve(10, true, 1).unwrap(), EntityType1_8::MinecartChest.id());
        assert_eq!(registry.resolve(10, true, 6).unwrap(), EntityType1_8::MinecartCommandBlock.id());
        assert_eq!(registry.resolve(10, true, 42).unwrap(), EntityType1_8::MinecartEmpty.id());
        // Falling block data is a block id, not a subtype.
        assert_eq!(registry.resolve(70, true, 12).unwrap(), EntityType1_8::FallingBlock.id());
    }

    #[test]
    fn test_unknown_code_falls_back_to_root() {
        let registry = entity_registry().unwrap();
        assert!(registry.resolve(9999, false, 0).is_err());
        assert_eq!(registry.resolve_or_fallback(9999, false, 0), EntityType1_8::Entity.id());
    }
}
