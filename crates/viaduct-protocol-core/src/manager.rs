use crate::error::DefinitionError;
use crate::protocol::{ProtocolDefinition, ProtocolProvider};
use crate::ProtocolVersion;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::info;
use viaduct_data::MappingData;

/// The version graph: every registered definition is an edge from its
/// server version to its client version.
#[derive(Debug, Default)]
pub struct ProtocolManager {
    definitions: Vec<Arc<ProtocolDefinition>>,
}

impl ProtocolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ProtocolDefinition) {
        info!(
            "Registered protocol {} -> {}",
            definition.server_version(),
            definition.client_version()
        );
        self.definitions.push(Arc::new(definition));
    }

    pub fn register_provider(
        &mut self,
        provider: &dyn ProtocolProvider,
        mappings: Arc<MappingData>,
    ) -> Result<(), DefinitionError> {
        self.register(provider.build(mappings)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Shortest chain of definitions from `server` up to `client`, server side
    /// first. Equal versions give an empty chain.
    pub fn path(
        &self,
        client: ProtocolVersion,
        server: ProtocolVersion,
    ) -> Option<Vec<Arc<ProtocolDefinition>>> {
        if client == server {
            return Some(Vec::new());
        }
        let mut came_from: HashMap<ProtocolVersion, usize> = HashMap::new();
        let mut seen = HashSet::from([server]);
        let mut queue = VecDeque::from([server]);
        while let Some(version) = queue.pop_front() {
            if version == client {
                break;
            }
            for (index, def) in self.definitions.iter().enumerate() {
                if def.server_version() == version && seen.insert(def.client_version()) {
                    came_from.insert(def.client_version(), index);
                    queue.push_back(def.client_version());
                }
            }
        }

        let mut chain = Vec::new();
        let mut cursor = client;
        while cursor != server {
            let index = *came_from.get(&cursor)?;
            let def = &self.definitions[index];
            chain.push(def.clone());
            cursor = def.server_version();
        }
        chain.reverse();
        Some(chain)
    }

    /// Client versions reachable from `server`.
    pub fn supported_clients(&self, server: ProtocolVersion) -> Vec<ProtocolVersion> {
        let mut out: Vec<_> = ProtocolVersion::KNOWN
            .into_iter()
            .filter(|client| self.path(*client, server).is_some())
            .collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(server: ProtocolVersion, client: ProtocolVersion) -> ProtocolDefinition {
        ProtocolDefinition::builder(server, client).build().unwrap()
    }

    fn manager() -> ProtocolManager {
        let mut manager = ProtocolManager::new();
        manager.register(edge(ProtocolVersion::V1_20, ProtocolVersion::V1_20_2));
        manager.register(edge(ProtocolVersion::V1_20_2, ProtocolVersion::V1_20_3));
        manager.register(edge(ProtocolVersion::V1_20_3, ProtocolVersion::V1_20_5));
        manager.register(edge(ProtocolVersion::V1_8, ProtocolVersion::V1_9));
        manager
    }

    #[test]
    fn test_multi_hop_path_is_server_first() {
        let path = manager()
            .path(ProtocolVersion::V1_20_5, ProtocolVersion::V1_20)
            .unwrap();
        let hops: Vec<_> = path
            .iter()
            .map(|d| (d.server_version(), d.client_version()))
            .collect();
        assert_eq!(
            hops,
            vec![
                (ProtocolVersion::V1_20, ProtocolVersion::V1_20_2),
                (ProtocolVersion::V1_20_2, ProtocolVersion::V1_20_3),
                (ProtocolVersion::V1_20_3, ProtocolVersion::V1_20_5),
            ]
        );
    }

    #[test]
    fn test_no_path() {
        let manager = manager();
        assert!(manager.path(ProtocolVersion::V1_9, ProtocolVersion::V1_20).is_none());
        assert!(manager.path(ProtocolVersion::V1_8, ProtocolVersion::V1_9).is_none());
        assert!(manager.path(ProtocolVersion(1), ProtocolVersion::V1_20).is_none());
        assert_eq!(
            manager.path(ProtocolVersion::V1_20, ProtocolVersion::V1_20).map(|p| p.len()),
            Some(0)
        );
    }

    #[test]
    fn test_supported_clients() {
        assert_eq!(
            manager().supported_clients(ProtocolVersion::V1_8),
            vec![ProtocolVersion::V1_8, ProtocolVersion::V1_9]
        );
    }
}
