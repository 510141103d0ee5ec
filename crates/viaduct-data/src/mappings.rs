use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Bundled mapping files, keyed by `<server>-to-<client>` version names.
const BUNDLED: &[(&str, &str)] = &[
    ("1.8-to-1.9", include_str!("../data/1.8-to-1.9.json")),
    ("1.20-to-1.20.2", include_str!("../data/1.20-to-1.20.2.json")),
    ("1.20.3-to-1.20.5", include_str!("../data/1.20.3-to-1.20.5.json")),
];

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid mapping json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no bundled mappings named {0}")]
    UnknownBundle(String),
    #[error("mapping key {0:?} is not an integer id")]
    InvalidKey(String),
}

/// Old id → new id table. Ids absent from the table map to themselves;
/// a target of `-1` means the id has no equivalent in the newer version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HashMap<String, i32>")]
pub struct IdMap {
    entries: HashMap<i32, i32>,
}

impl IdMap {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, i32)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    pub fn get(&self, old: i32) -> Option<i32> {
        match self.entries.get(&old) {
            Some(-1) => None,
            Some(new) => Some(*new),
            None => Some(old),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<HashMap<String, i32>> for IdMap {
    type Error = MappingError;

    fn try_from(raw: HashMap<String, i32>) -> Result<Self, Self::Error> {
        let mut entries = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let old = key
                .parse::<i32>()
                .map_err(|_| MappingError::InvalidKey(key.clone()))?;
            entries.insert(old, value);
        }
        Ok(Self { entries })
    }
}

/// Lookup tables for one version pair.
///
/// `entities`, `particles` and `structured_data_keys` are registry orders: the
/// position of an identifier is its wire id. The `IdMap` tables translate ids
/// from the older version to the newer one; `registries` holds the tables of
/// the remaining registries by name (`block`, `entity_type`, `fluid`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingData {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub particles: Vec<String>,
    #[serde(default)]
    pub blockstates: IdMap,
    #[serde(default)]
    pub items: IdMap,
    #[serde(default)]
    pub sounds: IdMap,
    #[serde(default)]
    pub registries: HashMap<String, IdMap>,
    #[serde(default)]
    pub structured_data_keys: Vec<String>,
    #[serde(default)]
    pub enabled_features: Vec<String>,
}

impl MappingData {
    pub fn from_json(text: &str) -> Result<Self, MappingError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let text = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data = Self::from_json(&text)?;
        debug!("Loaded mappings {} -> {} from {}", data.from, data.to, path.display());
        Ok(data)
    }

    /// Mapping data compiled into the binary.
    pub fn bundled(name: &str) -> Result<Self, MappingError> {
        let (_, text) = BUNDLED
            .iter()
            .find(|(bundle, _)| *bundle == name)
            .ok_or_else(|| MappingError::UnknownBundle(name.to_string()))?;
        Self::from_json(text)
    }

    /// Loads `<dir>/<name>.json` when it exists, falling back to the bundled copy.
    pub fn load_or_bundled(dir: Option<&Path>, name: &str) -> Result<Self, MappingError> {
        if let Some(dir) = dir {
            let path = dir.join(format!("{}.json", name));
            if path.exists() {
                info!("Using mapping override {}", path.display());
                return Self::load(&path);
            }
        }
        Self::bundled(name)
    }

    pub fn entity_code(&self, identifier: &str) -> Option<i32> {
        position_of(&self.entities, identifier)
    }

    /// Id table of a registry by name, with or without the `minecraft:`
    /// namespace. Items are kept in `items`.
    pub fn registry(&self, name: &str) -> Option<&IdMap> {
        let name = strip_namespace(name);
        if name == "item" {
            return Some(&self.items);
        }
        self.registries
            .iter()
            .find(|(key, _)| strip_namespace(key) == name)
            .map(|(_, map)| map)
    }
}

fn strip_namespace(identifier: &str) -> &str {
    identifier.strip_prefix("minecraft:").unwrap_or(identifier)
}

fn position_of(list: &[String], identifier: &str) -> Option<i32> {
    let key = strip_namespace(identifier);
    list.iter()
        .position(|entry| strip_namespace(entry) == key)
        .map(|i| i as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_map_semantics() {
        let map = IdMap::from_pairs([(5, 7), (9, -1)]);
        assert_eq!(map.get(5), Some(7));
        assert_eq!(map.get(9), None);
        assert_eq!(map.get(100), Some(100));
    }

    #[test]
    fn test_parse_mapping_json() {
        let data = MappingData::from_json(
            r#"{
                "from": "a", "to": "b",
                "entities": ["zombie", "minecraft:player"],
                "blockstates": {"1": 2, "3": -1},
                "registries": {"minecraft:cat_variant": {"0": 1}}
            }"#,
        )
        .unwrap();
        assert_eq!(data.entity_code("minecraft:zombie"), Some(0));
        assert_eq!(data.entity_code("player"), Some(1));
        assert_eq!(data.entity_code("creeper"), None);
        assert_eq!(data.blockstates.get(1), Some(2));
        assert_eq!(data.blockstates.get(3), None);
        assert_eq!(data.registry("cat_variant").and_then(|map| map.get(0)), Some(1));
        assert!(data.registry("minecraft:frog_variant").is_none());
        assert!(std::ptr::eq(data.registry("minecraft:item").unwrap(), &data.items));
    }

    #[test]
    fn test_rejects_non_numeric_keys() {
        let err = MappingData::from_json(r#"{"items": {"stone": 1}}"#).unwrap_err();
        assert!(matches!(err, MappingError::Json(_)));
    }

    #[test]
    fn test_bundled_files_parse() {
        for (name, _) in BUNDLED {
            let data = MappingData::bundled(name).unwrap();
            assert!(!data.from.is_empty(), "{} has no version names", name);
        }
        let modern = MappingData::bundled("1.20-to-1.20.2").unwrap();
        assert!(modern.entity_code("falling_block").is_some());
        assert!(modern.particles.iter().any(|p| p == "minecraft:item"));
        assert!(matches!(
            MappingData::bundled("1.7-to-1.8"),
            Err(MappingError::UnknownBundle(_))
        ));
    }

    #[test]
    fn test_override_directory_falls_back() {
        let dir = std::env::temp_dir().join("viaduct-mappings-missing");
        let data = MappingData::load_or_bundled(Some(&dir), "1.8-to-1.9").unwrap();
        assert_eq!(data.to, "1.9");
    }
}
