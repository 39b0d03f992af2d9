use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::{CategoryEntry, CategoryInfo};

/// Read-only category name -> risk attributes map, loaded once per process.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CategoryLookup {
    lookup: BTreeMap<String, CategoryInfo>,
}

impl CategoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unnamed entries are skipped. On duplicate names the last entry wins.
    pub fn from_entries(entries: impl IntoIterator<Item = CategoryEntry>) -> Self {
        let mut lookup = BTreeMap::new();
        for e in entries {
            let Some(name) = e.category_name.filter(|n| !n.trim().is_empty()) else {
                continue;
            };
            lookup.insert(
                name,
                CategoryInfo {
                    risk_level: e.risk_level,
                    risk_rating: e.risk_rating,
                    category_id: e.category_id.to_string(),
                },
            );
        }
        Self { lookup }
    }

    pub fn get(&self, name: &str) -> Option<&CategoryInfo> {
        self.lookup.get(name)
    }

    /// Category names, sorted.
    pub fn options(&self) -> Vec<&str> {
        self.lookup.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Set the category on a grid row along with its dependent fields.
    /// Returns false (row untouched) for an empty or unknown name.
    pub fn apply_to_row(&self, row: &mut Map<String, JsonValue>, name: &str) -> bool {
        let Some(info) = self.get(name) else {
            return false;
        };
        row.insert("analyst_cat".into(), JsonValue::from(name));
        row.insert("analyst_risk_level".into(), info.risk_level.map_or(JsonValue::Null, JsonValue::from));
        row.insert(
            "risk_rating".into(),
            info.risk_rating.clone().map_or(JsonValue::Null, JsonValue::from),
        );
        row.insert("analyst_cat_id".into(), JsonValue::from(info.category_id.clone()));
        true
    }
}
