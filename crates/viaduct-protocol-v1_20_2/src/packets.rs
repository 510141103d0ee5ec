//! Packet ids that changed between 1.20 and 1.20.2.

pub mod clientbound {
    pub const SPAWN_ENTITY: i32 = 0x01;
    pub const SPAWN_PLAYER: i32 = 0x03;
    pub const CONTAINER_CONTENT: i32 = 0x12;
    pub const CONTAINER_SLOT: i32 = 0x14;
    pub const CHUNK_DATA: i32 = 0x24;
    pub const JOIN_GAME: i32 = 0x28;
    pub const REMOVE_ENTITIES: i32 = 0x3E;
    pub const RESPAWN: i32 = 0x41;
    pub const ENTITY_METADATA: i32 = 0x52;
    pub const UPDATE_ENABLED_FEATURES: i32 = 0x6B;
    pub const ENTITY_EFFECT: i32 = 0x6C;
    pub const LAST: i32 = 0x6E;

    /// 1.20.2 id of a 1.20 play packet. Spawn player and enabled features
    /// have no play counterpart.
    pub fn mapped(id: i32) -> Option<i32> {
        match id {
            0x00..=0x02 => Some(id),
            0x04..=0x0C => Some(id - 1),
            0x0D..=0x32 => Some(id + 1),
            0x33..=0x62 => Some(id + 2),
            0x63..=0x6A => Some(id + 3),
            0x6C..=LAST => Some(id + 2),
            _ => None,
        }
    }
}

pub mod serverbound {
    pub const CHUNK_BATCH_RECEIVED: i32 = 0x07;
    pub const CONFIGURATION_ACK: i32 = 0x0B;
    pub const PING_REQUEST: i32 = 0x1D;
    pub const LAST: i32 = 0x35;

    /// 1.20 id of a 1.20.2 play packet.
    pub fn mapped(id: i32) -> Option<i32> {
        match id {
            0x00..=0x06 => Some(id),
            0x08..=0x0A => Some(id - 1),
            0x0C..=0x1C => Some(id - 2),
            0x1E..=LAST => Some(id - 3),
            _ => None,
        }
    }

    pub const PLAY_CLIENT_INFORMATION: i32 = 0x08;
    pub const PLAY_PLUGIN_MESSAGE: i32 = 0x0D;
    pub const PLAY_KEEP_ALIVE: i32 = 0x12;
    pub const PLAY_PONG: i32 = 0x20;
    pub const PLAY_RESOURCE_PACK: i32 = 0x24;
}

/// 1.20.2 configuration phase ids.
pub mod configuration {
    pub mod clientbound {
        pub const FINISH_CONFIGURATION: i32 = 0x02;
        pub const REGISTRY_DATA: i32 = 0x05;
        pub const UPDATE_ENABLED_FEATURES: i32 = 0x07;
    }

    pub mod serverbound {
        pub const CLIENT_INFORMATION: i32 = 0x00;
        pub const PLUGIN_MESSAGE: i32 = 0x01;
        pub const FINISH_CONFIGURATION: i32 = 0x02;
        pub const KEEP_ALIVE: i32 = 0x03;
        pub const PONG: i32 = 0x04;
        pub const RESOURCE_PACK: i32 = 0x05;
    }
}

pub const LOGIN_ACKNOWLEDGED: i32 = 0x03;
