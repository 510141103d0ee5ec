use viaduct_data::MappingData;
use viaduct_protocol_core::entity_types;
use viaduct_protocol_core::WireCode::{Abstract, Mapped};
use viaduct_protocol_core::{EntityTypeRegistry, RegistryError};

entity_types! {
    /// 1.19.4 / 1.20 entity taxonomy. Wire codes come from the mapping data's
    /// registry order.
    pub enum EntityType1_19_4 {
        Entity("entity", Abstract),
        AreaEffectCloud("area_effect_cloud", Mapped, Entity),
        EndCrystal("end_crystal", Mapped, Entity),
        EvokerFangs("evoker_fangs", Mapped, Entity),
        ExperienceOrb("experience_orb", Mapped, Entity),
        EyeOfEnder("eye_of_ender", Mapped, Entity),
        FallingBlock("falling_block", Mapped, Entity),
        Item("item", Mapped, Entity),
        Tnt("tnt", Mapped, Entity),
        LightningBolt("lightning_bolt", Mapped, Entity),
        Marker("marker", Mapped, Entity),
        Interaction("interaction", Mapped, Entity),
        Display("display", Abstract, Entity),
        BlockDisplay("block_display", Mapped, Display),
        ItemDisplay("item_display", Mapped, Display),
        TextDisplay("text_display", Mapped, Display),
        Boat("boat", Mapped, Entity),
        ChestBoat("chest_boat", Mapped, Boat),
        AbstractMinecart("abstract_minecart", Abstract, Entity),
        Minecart("minecart", Mapped, AbstractMinecart),
        CommandBlockMinecart("command_block_minecart", Mapped, AbstractMinecart),
        FurnaceMinecart("furnace_minecart", Mapped, AbstractMinecart),
        SpawnerMinecart("spawner_minecart", Mapped, AbstractMinecart),
        TntMinecart("tnt_minecart", Mapped, AbstractMinecart),
        ContainerMinecart("abstract_container_minecart", Abstract, AbstractMinecart),
        ChestMinecart("chest_minecart", Mapped, ContainerMinecart),
        HopperMinecart("hopper_minecart", Mapped, ContainerMinecart),
        Hanging("abstract_hanging", Abstract, Entity),
        ItemFrame("item_frame", Mapped, Hanging),
        GlowItemFrame("glow_item_frame", Mapped, ItemFrame),
        LeashKnot("leash_knot", Mapped, Hanging),
        Painting("painting", Mapped, Hanging),
        Projectile("projectile_abstract", Abstract, Entity),
        FishingBobber("fishing_bobber", Mapped, Projectile),
        LlamaSpit("llama_spit", Mapped, Projectile),
        ShulkerBullet("shulker_bullet", Mapped, Projectile),
        FireworkRocket("firework_rocket", Mapped, Projectile),
        AbstractArrow("abstract_arrow", Abstract, Projectile),
        Arrow("arrow", Mapped, AbstractArrow),
        SpectralArrow("spectral_arrow", Mapped, AbstractArrow),
        Trident("trident", Mapped, AbstractArrow),
        Fireball("abstract_fireball", Abstract, Projectile),
        DragonFireball("dragon_fireball", Mapped, Fireball),
        LargeFireball("fireball", Mapped, Fireball),
        SmallFireball("small_fireball", Mapped, Fireball),
        WitherSkull("wither_skull", Mapped, Fireball),
        Throwable("throwable_item_projectile", Abstract, Projectile),
        Egg("egg", Mapped, Throwable),
        EnderPearl("ender_pearl", Mapped, Throwable),
        ExperienceBottle("experience_bottle", Mapped, Throwable),
        Potion("potion", Mapped, Throwable),
        Snowball("snowball", Mapped, Throwable),
        Living("living_entity", Abstract, Entity),
        ArmorStand("armor_stand", Mapped, Living),
        Player("player", Mapped, Living),
        Mob("mob", Abstract, Living),
        EnderDragon("ender_dragon", Mapped, Mob),
        Ghast("ghast", Mapped, Mob),
        Phantom("phantom", Mapped, Mob),
        Slime("slime", Mapped, Mob),
        MagmaCube("magma_cube", Mapped, Slime),
        Bat("bat", Mapped, Mob),
        PathfinderMob("pathfinder_mob", Abstract, Mob),
        Allay("allay", Mapped, PathfinderMob),
        Golem("abstract_golem", Abstract, PathfinderMob),
        IronGolem("iron_golem", Mapped, Golem),
        SnowGolem("snow_golem", Mapped, Golem),
        Shulker("shulker", Mapped, Golem),
        WaterAnimal("water_animal", Abstract, PathfinderMob),
        Squid("squid", Mapped, WaterAnimal),
        GlowSquid("glow_squid", Mapped, Squid),
        Dolphin("dolphin", Mapped, WaterAnimal),
        Fish("abstract_fish", Abstract, WaterAnimal),
        Cod("cod", Mapped, Fish),
        Pufferfish("pufferfish", Mapped, Fish),
        Salmon("salmon", Mapped, Fish),
        TropicalFish("tropical_fish", Mapped, Fish),
        Tadpole("tadpole", Mapped, Fish),
        Ageable("ageable_mob", Abstract, PathfinderMob),
        Villager("villager", Mapped, Ageable),
        WanderingTrader("wandering_trader", Mapped, Ageable),
        Animal("animal", Abstract, Ageable),
        Axolotl("axolotl", Mapped, Animal),
        Bee("bee", Mapped, Animal),
        Chicken("chicken", Mapped, Animal),
        Cow("cow", Mapped, Animal),
        Mooshroom("mooshroom", Mapped, Cow),
        Fox("fox", Mapped, Animal),
        Frog("frog", Mapped, Animal),
        Goat("goat", Mapped, Animal),
        Hoglin("hoglin", Mapped, Animal),
        Ocelot("ocelot", Mapped, Animal),
        Panda("panda", Mapped, Animal),
        Pig("pig", Mapped, Animal),
        PolarBear("polar_bear", Mapped, Animal),
        Rabbit("rabbit", Mapped, Animal),
        Sheep("sheep", Mapped, Animal),
        Sniffer("sniffer", Mapped, Animal),
        Strider("strider", Mapped, Animal),
        Turtle("turtle", Mapped, Animal),
        Tameable("tameable_animal", Abstract, Animal),
        Cat("cat", Mapped, Tameable),
        Parrot("parrot", Mapped, Tameable),
        Wolf("wolf", Mapped, Tameable),
        AbstractHorse("abstract_horse", Abstract, Animal),
        Camel("camel", Mapped, AbstractHorse),
        Horse("horse", Mapped, AbstractHorse),
        SkeletonHorse("skeleton_horse", Mapped, AbstractHorse),
        ZombieHorse("zombie_horse", Mapped, AbstractHorse),
        ChestedHorse("chested_horse", Abstract, AbstractHorse),
        Donkey("donkey", Mapped, ChestedHorse),
        Mule("mule", Mapped, ChestedHorse),
        Llama("llama", Mapped, ChestedHorse),
        TraderLlama("trader_llama", Mapped, Llama),
        Monster("monster", Abstract, PathfinderMob),
        Blaze("blaze", Mapped, Monster),
        Creeper("creeper", Mapped, Monster),
        Enderman("enderman", Mapped, Monster),
        Endermite("endermite", Mapped, Monster),
        Giant("giant", Mapped, Monster),
        Guardian("guardian", Mapped, Monster),
        ElderGuardian("elder_guardian", Mapped, Guardian),
        Silverfish("silverfish", Mapped, Monster),
        Vex("vex", Mapped, Monster),
        Warden("warden", Mapped, Monster),
        Wither("wither", Mapped, Monster),
        Zoglin("zoglin", Mapped, Monster),
        Spider("spider", Mapped, Monster),
        CaveSpider("cave_spider", Mapped, Spider),
        AbstractSkeleton("abstract_skeleton", Abstract, Monster),
        Skeleton("skeleton", Mapped, AbstractSkeleton),
        Stray("stray", Mapped, AbstractSkeleton),
        WitherSkeleton("wither_skeleton", Mapped, AbstractSkeleton),
        Zombie("zombie", Mapped, Monster),
        Drowned("drowned", Mapped, Zombie),
        Husk("husk", Mapped, Zombie),
        ZombieVillager("zombie_villager", Mapped, Zombie),
        ZombifiedPiglin("zombified_piglin", Mapped, Zombie),
        BasePiglin("abstract_piglin", Abstract, Monster),
        Piglin("piglin", Mapped, BasePiglin),
        PiglinBrute("piglin_brute", Mapped, BasePiglin),
        Raider("abstract_raider", Abstract, Monster),
        Ravager("ravager", Mapped, Raider),
        Witch("witch", Mapped, Raider),
        Illager("abstract_illager", Abstract, Raider),
        Pillager("pillager", Mapped, Illager),
        Vindicator("vindicator", Mapped, Illager),
        SpellcasterIllager("abstract_spellcaster_illager", Abstract, Illager),
        Evoker("evoker", Mapped, SpellcasterIllager),
        Illusioner("illusioner", Mapped, SpellcasterIllager),
    }
}

pub fn entity_registry(mappings: &MappingData) -> Result<EntityTypeRegistry, RegistryError> {
    EntityTypeRegistry::build(EntityType1_19_4::DECLARATIONS, Some(mappings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> MappingData {
        MappingData::bundled("1.20-to-1.20.2").unwrap()
    }

    #[test]
    fn test_every_mapped_entity_is_declared() {
        let mappings = bundled();
        let registry = entity_registry(&mappings).unwrap();
        for identifier in &mappings.entities {
            assert!(
                registry.by_identifier(identifier).is_some(),
                "{} missing from taxonomy",
                identifier
            );
        }
    }

    #[test]
    fn test_codes_follow_registry_order() {
        let registry = entity_registry(&bundled()).unwrap();
        assert_eq!(registry.resolve(118, false, 0).unwrap(), EntityType1_19_4::Zombie.id());
        assert_eq!(registry.resolve(36, false, 0).unwrap(), EntityType1_19_4::FallingBlock.id());
        assert_eq!(registry.resolve(122, false, 0).unwrap(), EntityType1_19_4::Player.id());
        assert!(registry.is_a(EntityType1_19_4::Husk.id(), EntityType1_19_4::Monster.id()));
    }
}
