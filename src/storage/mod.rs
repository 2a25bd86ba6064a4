//! String-keyed persistent slots.
//!
//! The ledger keeps its whole record list as one JSON string under a fixed key,
//! so the storage contract is just: read a slot, overwrite a slot.

mod migrations;
pub mod sqlite;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

pub use sqlite::Database;

#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Returns `None` when nothing has been written under `key` yet.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    async fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local slots.
///
/// Used when the on-disk database cannot be opened: the session keeps working
/// and simply forgets its list on exit.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.into(), value.into());
        Self {
            slots: RwLock::new(slots),
        }
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.slots
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_slots_overwrite() {
        let store = MemorySlotStore::with_slot("k", "one");
        assert_eq!(store.read("k").await.unwrap().as_deref(), Some("one"));

        store.write("k", "two").await.unwrap();
        assert_eq!(store.read("k").await.unwrap().as_deref(), Some("two"));
        assert_eq!(store.read("other").await.unwrap(), None);
    }
}
