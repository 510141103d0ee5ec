use serde::{Deserialize, Serialize};

/// A block position in the world (x, y, z integers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Encode as a 64-bit long (1.14+ protocol format).
    /// x: 26 bits, z: 26 bits, y: 12 bits
    pub fn encode(&self) -> u64 {
        ((self.x as u64 & 0x3FFFFFF) << 38)
            | ((self.z as u64 & 0x3FFFFFF) << 12)
            | (self.y as u64 & 0xFFF)
    }

    pub fn decode(val: u64) -> Self {
        let mut x = (val >> 38) as i32;
        let mut z = ((val >> 12) & 0x3FFFFFF) as i32;
        let mut y = (val & 0xFFF) as i32;
        if x >= 1 << 25 {
            x -= 1 << 26;
        }
        if z >= 1 << 25 {
            z -= 1 << 26;
        }
        if y >= 1 << 11 {
            y -= 1 << 12;
        }
        Self { x, y, z }
    }

    /// Encode in the 1.8 - 1.13 layout (x: 26 bits, y: 12 bits, z: 26 bits).
    pub fn encode_legacy(&self) -> u64 {
        ((self.x as u64 & 0x3FFFFFF) << 38)
            | ((self.y as u64 & 0xFFF) << 26)
            | (self.z as u64 & 0x3FFFFFF)
    }

    pub fn decode_legacy(val: u64) -> Self {
        let mut x = (val >> 38) as i32;
        let mut y = ((val >> 26) & 0xFFF) as i32;
        let mut z = (val & 0x3FFFFFF) as i32;
        if x >= 1 << 25 {
            x -= 1 << 26;
        }
        if y >= 1 << 11 {
            y -= 1 << 12;
        }
        if z >= 1 << 25 {
            z -= 1 << 26;
        }
        Self { x, y, z }
    }
}

/// A position qualified by the dimension it lives in (death location etc).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalPosition {
    pub dimension: String,
    pub pos: BlockPos,
}

/// Returns a resource identifier in `namespace:path` form, adding the
/// `minecraft` namespace when absent.
pub fn normalize_identifier(key: &str) -> String {
    match key.split_once(':') {
        Some(_) => key.to_string(),
        None => format!("minecraft:{}", key),
    }
}

/// Text component for disconnect reasons (simplified JSON text).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextComponent {
    pub text: String,
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"text":""}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_pos_roundtrip() {
        let pos = BlockPos::new(-1234, -60, 98765);
        assert_eq!(BlockPos::decode(pos.encode()), pos);
        assert_eq!(BlockPos::decode_legacy(pos.encode_legacy()), pos);
    }

    #[test]
    fn test_layouts_differ() {
        let pos = BlockPos::new(1, 2, 3);
        assert_ne!(pos.encode(), pos.encode_legacy());
    }

    #[test]
    fn test_identifier_gets_default_namespace() {
        assert_eq!(normalize_identifier("overworld"), "minecraft:overworld");
        assert_eq!(normalize_identifier("custom:dim"), "custom:dim");
    }

    #[test]
    fn test_text_component_json() {
        let text = TextComponent::plain("The backend must run in \"offline\" mode");
        assert_eq!(text.to_json(), r#"{"text":"The backend must run in \"offline\" mode"}"#);
    }
}
