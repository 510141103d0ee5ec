//! Packet ids that changed between 1.20.3 and 1.20.5.

pub mod login {
    pub const CLIENTBOUND_HELLO: i32 = 0x01;
    pub const SERVERBOUND_COOKIE_RESPONSE: i32 = 0x04;
}

pub mod clientbound {
    pub const STATISTICS: i32 = 0x04;
    pub const CONTAINER_CONTENT: i32 = 0x13;
    pub const CONTAINER_SLOT: i32 = 0x15;
    pub const DISCONNECT: i32 = 0x1B;
    pub const JOIN_GAME: i32 = 0x29;
    pub const RESPAWN: i32 = 0x45;
    pub const SERVER_DATA: i32 = 0x49;
    pub const ENTITY_SOUND: i32 = 0x65;
    pub const SOUND: i32 = 0x66;
    pub const UPDATE_TAGS: i32 = 0x74;
    pub const LAST: i32 = UPDATE_TAGS;

    /// 1.20.5 id of a 1.20.3 play packet. Cookie request, debug sample, store
    /// cookie and transfer were inserted in between.
    pub fn mapped(id: i32) -> Option<i32> {
        match id {
            0x00..=0x15 => Some(id),
            0x16..=0x19 => Some(id + 1),
            0x1A..=0x68 => Some(id + 2),
            0x69..=0x6F => Some(id + 3),
            0x70..=LAST => Some(id + 4),
            _ => None,
        }
    }
}

pub mod serverbound {
    pub const CHAT_COMMAND: i32 = 0x04;
    pub const SIGNED_CHAT_COMMAND: i32 = 0x05;
    pub const COOKIE_RESPONSE: i32 = 0x11;
    pub const DEBUG_SAMPLE_SUBSCRIPTION: i32 = 0x13;
    pub const LAST: i32 = 0x39;

    /// 1.20.3 id of a 1.20.5 play packet.
    pub fn mapped(id: i32) -> Option<i32> {
        match id {
            0x00..=0x04 => Some(id),
            SIGNED_CHAT_COMMAND => Some(CHAT_COMMAND),
            0x06..=0x10 => Some(id - 1),
            0x12 => Some(0x10),
            0x14..=LAST => Some(id - 3),
            _ => None,
        }
    }
}

/// Configuration phase ids.
pub mod configuration {
    pub mod clientbound {
        pub const REGISTRY_DATA: i32 = 0x05;
        /// 1.20.5 id of a registry data packet.
        pub const MAPPED_REGISTRY_DATA: i32 = 0x07;
        pub const UPDATE_TAGS: i32 = 0x09;
        pub const MAPPED_UPDATE_TAGS: i32 = 0x0D;

        /// Remaining 1.20.3 → 1.20.5 shifts.
        pub const REMAPPED: [(i32, i32); 8] = [
            (0x00, 0x01),
            (0x01, 0x02),
            (0x02, 0x03),
            (0x03, 0x04),
            (0x04, 0x05),
            (0x06, 0x08),
            (0x07, 0x09),
            (0x08, 0x0C),
        ];
    }

    pub mod serverbound {
        pub const COOKIE_RESPONSE: i32 = 0x01;
        pub const SELECT_KNOWN_PACKS: i32 = 0x07;

        /// 1.20.5 → 1.20.3 shifts.
        pub const REMAPPED: [(i32, i32); 5] =
            [(0x02, 0x01), (0x03, 0x02), (0x04, 0x03), (0x05, 0x04), (0x06, 0x05)];
    }
}
