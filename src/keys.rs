//! # Key Mapping
//!
//! Models keep camelCase keys in memory and exchange snake_case keys with the
//! backend. A [`KeyMap`] is derived once from a resource's [`AttributeSet`] and
//! applied at the two serialization boundaries (deserialize and `serialize()`).
//! Keys outside the declared attributes fall back to the plain string
//! case conversion, so undescribed attributes still round-trip. Letter/digit
//! boundaries split words: `address1` goes out as `address_1`.

use crate::descriptor::AttributeSet;
use bimap::BiMap;
use convert_case::{Case, Casing};
use serde_json::{Map, Value};

/// Bidirectional local (camelCase) to wire (snake_case) key table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyMap {
    table: BiMap<String, String>,
}

impl KeyMap {
    pub fn from_attributes(attributes: &AttributeSet) -> Self {
        let mut table = BiMap::new();
        for name in attributes.names() {
            table.insert(name.to_string(), name.to_case(Case::Snake));
        }
        Self { table }
    }

    pub fn to_wire(&self, local: &str) -> String {
        self.table
            .get_by_left(local)
            .cloned()
            .unwrap_or_else(|| local.to_case(Case::Snake))
    }

    pub fn to_local(&self, wire: &str) -> String {
        self.table
            .get_by_right(wire)
            .cloned()
            .unwrap_or_else(|| wire.to_case(Case::Camel))
    }

    /// Renames the top-level keys of `record` to wire casing.
    pub fn record_to_wire(&self, record: &Map<String, Value>) -> Map<String, Value> {
        record
            .iter()
            .map(|(key, value)| (self.to_wire(key), value.clone()))
            .collect()
    }

    /// Renames the top-level keys of `record` to local casing.
    pub fn record_to_local(&self, record: &Map<String, Value>) -> Map<String, Value> {
        record
            .iter()
            .map(|(key, value)| (self.to_local(key), value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
