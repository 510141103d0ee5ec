use crate::ConnectionState;

/// A protocol version number as sent in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(pub i32);

impl ProtocolVersion {
    pub const V1_8: Self = Self(47);
    pub const V1_9: Self = Self(107);
    pub const V1_20: Self = Self(763);
    pub const V1_20_2: Self = Self(764);
    pub const V1_20_3: Self = Self(765);
    pub const V1_20_5: Self = Self(766);

    pub const KNOWN: [Self; 6] = [
        Self::V1_8,
        Self::V1_9,
        Self::V1_20,
        Self::V1_20_2,
        Self::V1_20_3,
        Self::V1_20_5,
    ];

    pub fn id(self) -> i32 {
        self.0
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            47 => "1.8",
            107 => "1.9",
            763 => "1.20",
            764 => "1.20.2",
            765 => "1.20.3",
            766 => "1.20.5",
            _ => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::KNOWN.into_iter().find(|v| v.name() == name)
    }

    pub fn is_known(self) -> bool {
        Self::KNOWN.contains(&self)
    }

    /// Whether login is followed by the configuration phase.
    pub fn has_configuration_phase(self) -> bool {
        self >= Self::V1_20_2
    }

    /// Whether play and configuration disconnect reasons are NBT text rather than JSON.
    pub fn uses_nbt_text(self) -> bool {
        self >= Self::V1_20_3
    }

    /// Whether raw network NBT omits the root name.
    pub fn uses_nameless_nbt(self) -> bool {
        self >= Self::V1_20_2
    }

    pub fn login_success_id(self) -> i32 {
        0x02
    }

    pub fn set_compression_id(self) -> i32 {
        0x03
    }

    /// Serverbound login acknowledgement; only exists with a configuration phase.
    pub fn login_ack_id(self) -> Option<i32> {
        self.has_configuration_phase().then_some(0x03)
    }

    /// Serverbound acknowledgement of the server's finish configuration packet.
    pub fn finish_configuration_ack_id(self) -> Option<i32> {
        match self {
            Self::V1_20_2 | Self::V1_20_3 => Some(0x02),
            Self::V1_20_5 => Some(0x03),
            _ => None,
        }
    }

    /// Serverbound acknowledgement of a play-phase start configuration packet.
    pub fn configuration_ack_id(self) -> Option<i32> {
        match self {
            Self::V1_20_2 | Self::V1_20_3 => Some(0x0B),
            Self::V1_20_5 => Some(0x0C),
            _ => None,
        }
    }

    pub fn disconnect_id(self, phase: ConnectionState) -> Option<i32> {
        match phase {
            ConnectionState::Login => Some(0x00),
            ConnectionState::Configuration => match self {
                Self::V1_20_2 | Self::V1_20_3 => Some(0x01),
                Self::V1_20_5 => Some(0x02),
                _ => None,
            },
            ConnectionState::Play => match self {
                Self::V1_8 => Some(0x40),
                Self::V1_9 | Self::V1_20 => Some(0x1A),
                Self::V1_20_2 | Self::V1_20_3 => Some(0x1B),
                Self::V1_20_5 => Some(0x1D),
                _ => None,
            },
            ConnectionState::Handshaking | ConnectionState::Status => None,
        }
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}
