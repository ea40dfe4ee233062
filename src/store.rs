//! In-memory value store for normalized readings
//!
//! Readings are published keyed by component identity, last write wins. The
//! store keeps only the latest value per component and offers no versioning
//! or persistence.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Last-write-wins store of the latest reading per component
#[derive(Default)]
pub struct ValueStore {
    values: RwLock<HashMap<String, Value>>,
}

impl ValueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a reading for the component, replacing any previous value
    pub async fn set<T: Serialize>(&self, component: &str, reading: &T) -> Result<()> {
        let value = serde_json::to_value(reading)?;
        self.values
            .write()
            .await
            .insert(component.to_string(), value);
        Ok(())
    }

    /// Latest reading for the component, if any
    pub async fn get(&self, component: &str) -> Option<Value> {
        self.values.read().await.get(component).cloned()
    }

    /// Component ids currently present in the store
    pub async fn components(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn last_write_wins() {
        let store = ValueStore::new();
        store.set("evse", &json!({"charging": false})).await.unwrap();
        store.set("evse", &json!({"charging": true})).await.unwrap();
        assert_eq!(store.get("evse").await, Some(json!({"charging": true})));
    }

    #[tokio::test]
    async fn components_are_listed_sorted() {
        let store = ValueStore::new();
        store.set("evse", &json!(1)).await.unwrap();
        store.set("battery", &json!(2)).await.unwrap();
        assert_eq!(store.components().await, vec!["battery", "evse"]);
        assert_eq!(store.get("unknown").await, None);
    }
}
