//! Versioned entity taxonomies.
//!
//! A taxonomy is declared once per protocol version with [`entity_types!`],
//! which produces a `#[repr(u16)]` enum and its declaration table. The
//! declaration table is turned into an [`EntityTypeRegistry`] at startup.

use crate::error::{RegistryError, TranslationError};
use std::collections::HashMap;
use tracing::{debug, warn};
use viaduct_data::MappingData;

/// Index of a node in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityTypeId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireCode {
    /// Grouping node with no code on the wire.
    Abstract,
    Fixed(i32),
    /// Looked up by identifier in the version's mapping data.
    Mapped,
}

#[derive(Debug, Clone, Copy)]
pub struct EntityTypeDecl {
    pub identifier: &'static str,
    pub code: WireCode,
    pub parent: Option<u16>,
}

/// Declares a version's entity taxonomy.
///
/// ```ignore
/// entity_types! {
///     pub enum EntityType1_8 {
///         Entity("entity", WireCode::Abstract),
///         Living("living", WireCode::Abstract, Entity),
///         Zombie("zombie", WireCode::Fixed(54), Living),
///     }
/// }
/// ```
///
/// Parents must be declared before their children.
#[macro_export]
macro_rules! entity_types {
    (@parent $name:ident) => {
        None
    };
    (@parent $name:ident $parent:ident) => {
        Some($name::$parent as u16)
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident ( $ident:literal, $code:expr $(, $parent:ident)? ) ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        $vis enum $name {
            $( $variant ),*
        }

        impl $name {
            pub const DECLARATIONS: &'static [$crate::entity::EntityTypeDecl] = &[
                $( $crate::entity::EntityTypeDecl {
                    identifier: $ident,
                    code: $code,
                    parent: $crate::entity_types!(@parent $name $($parent)?),
                } ),*
            ];

            pub const fn id(self) -> $crate::entity::EntityTypeId {
                $crate::entity::EntityTypeId(self as u16)
            }
        }
    };
}

#[derive(Debug)]
struct Node {
    identifier: &'static str,
    parent: Option<EntityTypeId>,
    code: Option<i32>,
}

/// Immutable tree of a version's entity types.
#[derive(Debug)]
pub struct EntityTypeRegistry {
    nodes: Vec<Node>,
    by_code: HashMap<i32, EntityTypeId>,
    by_identifier: HashMap<&'static str, EntityTypeId>,
    objects: HashMap<(i32, i32), EntityTypeId>,
}

impl EntityTypeRegistry {
    /// Builds the tree. `Mapped` codes are resolved against `mappings.entities`.
    pub fn build(
        declarations: &'static [EntityTypeDecl],
        mappings: Option<&MappingData>,
    ) -> Result<Self, RegistryError> {
        if declarations.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut nodes = Vec::with_capacity(declarations.len());
        let mut by_code: HashMap<i32, EntityTypeId> = HashMap::new();
        let mut by_identifier = HashMap::new();

        for (index, decl) in declarations.iter().enumerate() {
            let id = EntityTypeId(index as u16);
            let parent = match decl.parent {
                Some(p) if (p as usize) < index => Some(EntityTypeId(p)),
                Some(p) => {
                    return Err(RegistryError::ParentNotDeclared {
                        child: decl.identifier,
                        parent: p,
                    })
                }
                None if index == 0 => None,
                None => return Err(RegistryError::SecondRoot(decl.identifier)),
            };

            let code = match decl.code {
                WireCode::Abstract => None,
                WireCode::Fixed(code) => Some(code),
                WireCode::Mapped => {
                    let code = mappings.and_then(|m| m.entity_code(decl.identifier));
                    if code.is_none() {
                        debug!("No wire code for {} in mapping data", decl.identifier);
                    }
                    code
                }
            };
            if let Some(code) = code {
                if let Some(existing) = by_code.insert(code, id) {
                    return Err(RegistryError::DuplicateCode {
                        code,
                        first: declarations[existing.0 as usize].identifier,
                        second: decl.identifier,
                    });
                }
            }
            if by_identifier.insert(decl.identifier, id).is_some() {
                return Err(RegistryError::DuplicateIdentifier(decl.identifier));
            }
            nodes.push(Node {
                identifier: decl.identifier,
                parent,
                code,
            });
        }

        Ok(Self {
            nodes,
            by_code,
            by_identifier,
            objects: HashMap::new(),
        })
    }

    /// Adds the object-spawn table: `(spawn code, data, type)`.
    pub fn with_objects(
        mut self,
        objects: &[(i32, i32, EntityTypeId)],
    ) -> Result<Self, RegistryError> {
        for &(code, data, ty) in objects {
            if self.objects.insert((code, data), ty).is_some() {
                return Err(RegistryError::DuplicateObject { code, data });
            }
        }
        Ok(self)
    }

    pub fn root(&self) -> EntityTypeId {
        EntityTypeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolves a wire code. Object lookups fall back to the `(code, 0)` entry
    /// when no entry matches the auxiliary data exactly.
    pub fn resolve(
        &self,
        code: i32,
        is_object: bool,
        data: i32,
    ) -> Result<EntityTypeId, TranslationError> {
        let found = if is_object {
            self.objects
                .get(&(code, data))
                .or_else(|| self.objects.get(&(code, 0)))
        } else {
            self.by_code.get(&code)
        };
        found.copied().ok_or(TranslationError::UnknownEntityType {
            code,
            is_object,
            data,
        })
    }

    /// Like [`resolve`](Self::resolve), but logs and returns the root type on a miss.
    pub fn resolve_or_fallback(&self, code: i32, is_object: bool, data: i32) -> EntityTypeId {
        match self.resolve(code, is_object, data) {
            Ok(ty) => ty,
            Err(err) => {
                warn!("{}, treating as {}", err, self.identifier(self.root()));
                self.root()
            }
        }
    }

    pub fn parent(&self, ty: EntityTypeId) -> Option<EntityTypeId> {
        self.nodes.get(ty.0 as usize).and_then(|n| n.parent)
    }

    /// `ty` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, ty: EntityTypeId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: ((ty.0 as usize) < self.nodes.len()).then_some(ty),
        }
    }

    pub fn is_a(&self, ty: EntityTypeId, ancestor: EntityTypeId) -> bool {
        self.ancestors(ty).any(|t| t == ancestor)
    }

    pub fn identifier(&self, ty: EntityTypeId) -> &'static str {
        self.nodes
            .get(ty.0 as usize)
            .map(|n| n.identifier)
            .unwrap_or("unknown")
    }

    pub fn wire_code(&self, ty: EntityTypeId) -> Option<i32> {
        self.nodes.get(ty.0 as usize).and_then(|n| n.code)
    }

    pub fn by_identifier(&self, identifier: &str) -> Option<EntityTypeId> {
        let key = identifier.strip_prefix("minecraft:").unwrap_or(identifier);
        self.by_identifier.get(key).copied()
    }
}

pub struct Ancestors<'a> {
    registry: &'a EntityTypeRegistry,
    next: Option<EntityTypeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = EntityTypeId;

    fn next(&mut self) -> Option<EntityTypeId> {
        let current = self.next?;
        self.next = self.registry.parent(current);
        Some(current)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entity::WireCode::{Abstract, Fixed, Mapped};

    crate::entity_types! {
        pub enum TestEntity {
            Entity("entity", Abstract),
            Living("living", Abstract, Entity),
            Monster("monster", Abstract, Living),
            Zombie("zombie", Fixed(54), Monster),
            Husk("husk", Fixed(23), Zombie),
            Boat("boat", Fixed(41), Entity),
            Minecart("minecart", Mapped, Entity),
            Arrow("arrow", Fixed(10), Entity),
        }
    }

    pub(crate) fn registry() -> EntityTypeRegistry {
        EntityTypeRegistry::build(TestEntity::DECLARATIONS, None)
            .unwrap()
            .with_objects(&[(1, 0, TestEntity::Boat.id()), (60, 0, TestEntity::Arrow.id())])
            .unwrap()
    }

    #[test]
    fn test_resolve_by_code() {
        let reg = registry();
        assert_eq!(reg.resolve(54, false, 0).unwrap(), TestEntity::Zombie.id());
        assert!(matches!(
            reg.resolve(9999, false, 0),
            Err(TranslationError::UnknownEntityType { code: 9999, .. })
        ));
    }

    #[test]
    fn test_object_lookup_uses_zero_data_entry() {
        let reg = registry();
        assert_eq!(reg.resolve(60, true, 17).unwrap(), TestEntity::Arrow.id());
        assert!(reg.resolve(54, true, 0).is_err());
    }

    #[test]
    fn test_abstract_is_never_resolvable() {
        let reg = registry();
        assert!(reg.resolve(-1, false, 0).is_err());
        assert_eq!(reg.wire_code(TestEntity::Monster.id()), None);
    }

    #[test]
    fn test_fallback_is_root() {
        let reg = registry();
        assert_eq!(reg.resolve_or_fallback(9999, false, 0), TestEntity::Entity.id());
    }

    #[test]
    fn test_ancestry() {
        let reg = registry();
        let chain: Vec<_> = reg.ancestors(TestEntity::Husk.id()).collect();
        assert_eq!(
            chain,
            vec![
                TestEntity::Husk.id(),
                TestEntity::Zombie.id(),
                TestEntity::Monster.id(),
                TestEntity::Living.id(),
                TestEntity::Entity.id(),
            ]
        );
        assert!(reg.is_a(TestEntity::Husk.id(), TestEntity::Living.id()));
        assert!(!reg.is_a(TestEntity::Boat.id(), TestEntity::Living.id()));
        assert_eq!(reg.by_identifier("minecraft:husk"), Some(TestEntity::Husk.id()));
    }

    #[test]
    fn test_mapped_codes_come_from_mapping_data() {
        let mappings = MappingData {
            entities: vec!["minecraft:minecart".into()],
            ..MappingData::default()
        };
        let reg = EntityTypeRegistry::build(TestEntity::DECLARATIONS, Some(&mappings)).unwrap();
        assert_eq!(reg.resolve(0, false, 0).unwrap(), TestEntity::Minecart.id());

        let unmapped = EntityTypeRegistry::build(TestEntity::DECLARATIONS, None).unwrap();
        assert_eq!(unmapped.wire_code(TestEntity::Minecart.id()), None);
    }

    static BAD_ORDER: &[EntityTypeDecl] = &[
        EntityTypeDecl { identifier: "entity", code: Abstract, parent: None },
        EntityTypeDecl { identifier: "child", code: Fixed(1), parent: Some(2) },
        EntityTypeDecl { identifier: "late", code: Abstract, parent: Some(0) },
    ];

    static DUPLICATE_CODE: &[EntityTypeDecl] = &[
        EntityTypeDecl { identifier: "entity", code: Abstract, parent: None },
        EntityTypeDecl { identifier: "a", code: Fixed(1), parent: Some(0) },
        EntityTypeDecl { identifier: "b", code: Fixed(1), parent: Some(0) },
    ];

    #[test]
    fn test_build_rejects_invalid_trees() {
        assert!(matches!(
            EntityTypeRegistry::build(BAD_ORDER, None),
            Err(RegistryError::ParentNotDeclared { child: "child", .. })
        ));
        assert!(matches!(
            EntityTypeRegistry::build(DUPLICATE_CODE, None),
            Err(RegistryError::DuplicateCode { code: 1, .. })
        ));
        assert!(matches!(
            EntityTypeRegistry::build(&[], None),
            Err(RegistryError::Empty)
        ));
    }
}
