use tracing::debug;
use viaduct_nbt::NbtValue;

pub const DIMENSION_TYPE_REGISTRY: &str = "minecraft:dimension_type";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionType {
    pub name: String,
    pub id: i32,
    pub min_y: i32,
    pub height: i32,
}

/// Dimension types announced by the server, cached for later packets.
#[derive(Debug, Clone, Default)]
pub struct DimensionRegistry {
    entries: Vec<DimensionType>,
}

impl DimensionRegistry {
    /// Reads the `minecraft:dimension_type` entry of a registry codec compound.
    pub fn from_codec(codec: &NbtValue) -> Self {
        let Some(registry) = codec.get(DIMENSION_TYPE_REGISTRY) else {
            debug!("Registry codec has no {} entry", DIMENSION_TYPE_REGISTRY);
            return Self::default();
        };
        let entries = registry
            .get("value")
            .and_then(NbtValue::as_list)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let name = entry.get("name")?.as_str()?.to_string();
                let id = entry
                    .get("id")
                    .and_then(NbtValue::as_long)
                    .map_or(index as i32, |id| id as i32);
                let element = entry.get("element")?;
                Some(DimensionType {
                    name,
                    id,
                    min_y: element.get("min_y")?.as_long()? as i32,
                    height: element.get("height")?.as_long()? as i32,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn from_entries(entries: Vec<DimensionType>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&DimensionType> {
        self.entries.iter().find(|d| d.name == name)
    }

    pub fn id_of(&self, name: &str) -> Option<i32> {
        self.get(name).map(|d| d.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The world the client is currently in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldData {
    pub dimension: String,
    pub min_y: i32,
    pub height: i32,
}

impl WorldData {
    pub fn from_dimension(dimension: &DimensionType) -> Self {
        Self {
            dimension: dimension.name.clone(),
            min_y: dimension.min_y,
            height: dimension.height,
        }
    }

    /// Number of 16-block chunk sections.
    pub fn section_count(&self) -> usize {
        (self.height.max(0) / 16) as usize
    }
}
