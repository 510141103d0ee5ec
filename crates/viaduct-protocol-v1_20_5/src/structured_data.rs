use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use tracing::debug;
use viaduct_data::{IdMap, MappingData};
use viaduct_nbt::NbtValue;
use viaduct_protocol_core::codec::{read_varint, write_varint};
use viaduct_protocol_core::types::{Bool, Item, NamelessNbt, WireType};
use viaduct_protocol_core::{CodecError, CodecResult};
use viaduct_types::normalize_identifier;

pub const CUSTOM_DATA: &str = "minecraft:custom_data";
pub const DAMAGE: &str = "minecraft:damage";
pub const UNBREAKABLE: &str = "minecraft:unbreakable";
pub const CUSTOM_MODEL_DATA: &str = "minecraft:custom_model_data";
pub const REPAIR_COST: &str = "minecraft:repair_cost";

/// Bit of `HideFlags` that hides the unbreakable line.
const HIDE_UNBREAKABLE: i64 = 0x04;

/// Wire ids of item components, in registry order.
#[derive(Debug, Clone, Default)]
pub struct StructuredDataSchema {
    ids: HashMap<String, i32>,
    keys: Vec<String>,
}

impl StructuredDataSchema {
    pub fn from_keys(keys: &[String]) -> Self {
        let keys: Vec<String> = keys
            .iter()
            .map(|key| normalize_identifier(key))
            .collect();
        let ids = keys
            .iter()
            .enumerate()
            .map(|(id, key)| (key.clone(), id as i32))
            .collect();
        Self { ids, keys }
    }

    pub fn from_mappings(mappings: &MappingData) -> Self {
        Self::from_keys(&mappings.structured_data_keys)
    }

    pub fn id_of(&self, key: &str) -> Option<i32> {
        self.ids.get(key).copied()
    }

    pub fn key_of(&self, id: i32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.keys.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// The item components this translation produces.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredData {
    CustomData(NbtValue),
    Damage(i32),
    Unbreakable { show_in_tooltip: bool },
    CustomModelData(i32),
    RepairCost(i32),
}

impl StructuredData {
    pub fn key(&self) -> &'static str {
        match self {
            StructuredData::CustomData(_) => CUSTOM_DATA,
            StructuredData::Damage(_) => DAMAGE,
            StructuredData::Unbreakable { .. } => UNBREAKABLE,
            StructuredData::CustomModelData(_) => CUSTOM_MODEL_DATA,
            StructuredData::RepairCost(_) => REPAIR_COST,
        }
    }

    fn write_payload(&self, buf: &mut BytesMut) {
        match self {
            StructuredData::CustomData(tag) => tag.write_root_network(buf),
            StructuredData::Damage(value)
            | StructuredData::CustomModelData(value)
            | StructuredData::RepairCost(value) => write_varint(buf, *value),
            StructuredData::Unbreakable { show_in_tooltip } => Bool.write(buf, show_in_tooltip),
        }
    }

    fn read_payload(key: &str, buf: &mut Bytes) -> CodecResult<Option<Self>> {
        let value = match key {
            CUSTOM_DATA => NamelessNbt.read(buf)?.map(StructuredData::CustomData),
            DAMAGE => Some(StructuredData::Damage(read_varint(buf)?)),
            UNBREAKABLE => Some(StructuredData::Unbreakable {
                show_in_tooltip: Bool.read(buf)?,
            }),
            CUSTOM_MODEL_DATA => Some(StructuredData::CustomModelData(read_varint(buf)?)),
            REPAIR_COST => Some(StructuredData::RepairCost(read_varint(buf)?)),
            _ => None,
        };
        Ok(value)
    }
}

/// A 1.20.5 item stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentItem {
    pub id: i32,
    pub count: i32,
    pub components: Vec<StructuredData>,
}

impl ComponentItem {
    /// Converts a tagged item. Tag entries with a component equivalent are
    /// lifted out; whatever is left of the tag becomes `custom_data`.
    pub fn from_legacy(item: Item, items: &IdMap) -> Option<Self> {
        if item.count <= 0 {
            return None;
        }
        let Some(id) = items.get(item.id) else {
            debug!("Item {} has no 1.20.5 equivalent", item.id);
            return None;
        };

        let mut components = Vec::new();
        let mut rest = match item.tag {
            Some(NbtValue::Compound(entries)) => entries,
            Some(other) => {
                debug!("Dropping non-compound item tag {:?}", other.tag_id());
                Vec::new()
            }
            None => Vec::new(),
        };

        let mut take = |key: &str| {
            rest.iter()
                .position(|(name, _)| name == key)
                .map(|index| rest.remove(index).1)
        };
        let damage = take("Damage").and_then(|v| v.as_long());
        let unbreakable = take("Unbreakable").and_then(|v| v.as_long());
        let repair_cost = take("RepairCost").and_then(|v| v.as_long());
        let custom_model_data = take("CustomModelData").and_then(|v| v.as_long());
        let hide_flags = rest
            .iter()
            .find(|(name, _)| name == "HideFlags")
            .and_then(|(_, v)| v.as_long())
            .unwrap_or(0);

        if let Some(damage) = damage.filter(|d| *d != 0) {
            components.push(StructuredData::Damage(damage as i32));
        }
        if unbreakable.is_some_and(|u| u != 0) {
            components.push(StructuredData::Unbreakable {
                show_in_tooltip: hide_flags & HIDE_UNBREAKABLE == 0,
            });
        }
        if let Some(cost) = repair_cost {
            components.push(StructuredData::RepairCost(cost as i32));
        }
        if let Some(model) = custom_model_data {
            components.push(StructuredData::CustomModelData(model as i32));
        }
        if !rest.is_empty() {
            components.push(StructuredData::CustomData(NbtValue::Compound(rest)));
        }

        Some(Self {
            id,
            count: item.count as i32,
            components,
        })
    }

    pub fn get(&self, key: &str) -> Option<&StructuredData> {
        self.components.iter().find(|c| c.key() == key)
    }
}

/// 1.20.5 slot: varint count (zero is empty), varint id, then added and
/// removed component lists.
#[derive(Debug, Clone, Copy)]
pub struct ComponentItemType<'a> {
    pub schema: &'a StructuredDataSchema,
}

impl WireType for ComponentItemType<'_> {
    type Value = Option<ComponentItem>;

    fn read(&self, buf: &mut Bytes) -> CodecResult<Self::Value> {
        let count = read_varint(buf)?;
        if count <= 0 {
            return Ok(None);
        }
        let id = read_varint(buf)?;
        let added = read_varint(buf)?;
        let removed = read_varint(buf)?;
        let mut components = Vec::new();
        for _ in 0..added {
            let type_id = read_varint(buf)?;
            let component = self
                .schema
                .key_of(type_id)
                .map(|key| StructuredData::read_payload(key, buf))
                .transpose()?
                .flatten()
                .ok_or(CodecError::InvalidDiscriminant {
                    what: "item component",
                    value: type_id,
                })?;
            components.push(component);
        }
        // Removed components are bare ids.
        for _ in 0..removed {
            read_varint(buf)?;
        }
        Ok(Some(ComponentItem {
            id,
            count,
            components,
        }))
    }

    fn write(&self, buf: &mut BytesMut, value: &Self::Value) {
        let Some(item) = value else {
            write_varint(buf, 0);
            return;
        };
        let known: Vec<(i32, &StructuredData)> = item
            .components
            .iter()
            .filter_map(|component| match self.schema.id_of(component.key()) {
                Some(id) => Some((id, component)),
                None => {
                    debug!("No component id for {}", component.key());
                    None
                }
            })
            .collect();

        write_varint(buf, item.count);
        write_varint(buf, item.id);
        write_varint(buf, known.len() as i32);
        write_varint(buf, 0);
        for (id, component) in known {
            write_varint(buf, id);
            component.write_payload(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viaduct_nbt::nbt_compound;

    fn schema() -> StructuredDataSchema {
        StructuredDataSchema::from_mappings(&MappingData::bundled("1.20.3-to-1.20.5").unwrap())
    }

    #[test]
    fn test_schema_follows_registry_order() {
        let schema = schema();
        assert_eq!(schema.id_of(CUSTOM_DATA), Some(0));
        assert_eq!(schema.id_of(DAMAGE), Some(3));
        assert_eq!(schema.id_of(UNBREAKABLE), Some(4));
        assert_eq!(schema.id_of(CUSTOM_MODEL_DATA), Some(13));
        assert_eq!(schema.id_of(REPAIR_COST), Some(16));
        assert_eq!(schema.key_of(1), Some("minecraft:max_stack_size"));

        let short = StructuredDataSchema::from_keys(&["damage".to_string()]);
        assert_eq!(short.id_of(DAMAGE), Some(0));
    }

    #[test]
    fn test_tag_entries_become_components() {
        let mut item = Item::new(1, 3);
        item.tag = Some(nbt_compound! {
            "Damage" => NbtValue::Int(5),
            "Unbreakable" => NbtValue::Byte(1),
            "HideFlags" => NbtValue::Int(4),
            "RepairCost" => NbtValue::Int(2),
            "display" => nbt_compound! { "Name" => NbtValue::String("{\"text\":\"x\"}".into()) }
        });
        let converted = ComponentItem::from_legacy(item, &IdMap::from_pairs([(1, 7)])).unwrap();
        assert_eq!(converted.id, 7);
        assert_eq!(converted.count, 3);
        assert_eq!(converted.get(DAMAGE), Some(&StructuredData::Damage(5)));
        assert_eq!(
            converted.get(UNBREAKABLE),
            Some(&StructuredData::Unbreakable {
                show_in_tooltip: false
            })
        );
        assert_eq!(converted.get(REPAIR_COST), Some(&StructuredData::RepairCost(2)));
        assert!(converted.get(CUSTOM_MODEL_DATA).is_none());

        let Some(StructuredData::CustomData(rest)) = converted.get(CUSTOM_DATA) else {
            panic!("expected custom data");
        };
        assert!(rest.get("display").is_some());
        assert!(rest.get("HideFlags").is_some());
        assert!(rest.get("Damage").is_none());
    }

    #[test]
    fn test_zero_damage_and_empty_tag_add_nothing() {
        let mut item = Item::new(1, 1);
        item.tag = Some(nbt_compound! { "Damage" => NbtValue::Int(0) });
        let converted = ComponentItem::from_legacy(item, &IdMap::default()).unwrap();
        assert!(converted.components.is_empty());
    }

    #[test]
    fn test_unmapped_or_empty_items_are_empty_slots() {
        assert_eq!(ComponentItem::from_legacy(Item::new(9, 1), &IdMap::from_pairs([(9, -1)])), None);
        assert_eq!(ComponentItem::from_legacy(Item::new(1, 0), &IdMap::default()), None);
    }

    #[test]
    fn test_wire_layout() {
        let schema = schema();
        let ty = ComponentItemType { schema: &schema };
        let item = Some(ComponentItem {
            id: 300,
            count: 2,
            components: vec![
                StructuredData::Damage(9),
                StructuredData::Unbreakable {
                    show_in_tooltip: true,
                },
            ],
        });
        let mut buf = BytesMut::new();
        ty.write(&mut buf, &item);
        assert_eq!(&buf[..], &[2, 0xAC, 0x02, 2, 0, 3, 9, 4, 1]);
        assert_eq!(ty.read(&mut buf.freeze()).unwrap(), item);

        let mut empty = BytesMut::new();
        ty.write(&mut empty, &None);
        assert_eq!(&empty[..], &[0]);
    }

    #[test]
    fn test_unknown_component_id_is_rejected() {
        let schema = schema();
        let ty = ComponentItemType { schema: &schema };
        let mut bytes = Bytes::from_static(&[1, 1, 1, 0, 1, 64]);
        assert!(matches!(
            ty.read(&mut bytes),
            Err(CodecError::InvalidDiscriminant { value: 1, .. })
        ));
    }
}
