use crate::error::Error;
use crate::slot_store::SlotStore;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

type SlotPath = (String, Vec<String>);

fn slot_path(zone: &str, words: &[&str]) -> SlotPath {
    (
        zone.to_string(),
        words.iter().map(ToString::to_string).collect(),
    )
}

#[derive(Default, Debug)]
pub struct InMemorySlotStore {
    slots: RwLock<HashMap<SlotPath, String>>,
}

#[async_trait::async_trait]
impl SlotStore for InMemorySlotStore {
    async fn read_slot(&self, zone: &str, words: &[&str]) -> Result<Option<String>, Error> {
        Ok(self.slots.read().await.get(&slot_path(zone, words)).cloned())
    }

    async fn create_slot(&self, zone: &str, words: &[&str], content: &str) -> Result<bool, Error> {
        match self.slots.write().await.entry(slot_path(zone, words)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(e) => {
                e.insert(content.to_string());
                Ok(true)
            }
        }
    }

    async fn remove_slot(&self, zone: &str, words: &[&str]) -> Result<(), Error> {
        self.slots.write().await.remove(&slot_path(zone, words));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_is_exclusive() {
        let store = InMemorySlotStore::default();
        assert!(store.create_slot("z", &["a", "b"], "192.0.2.1").await.unwrap());
        assert!(!store.create_slot("z", &["a", "b"], "192.0.2.2").await.unwrap());
        assert_eq!(
            store.read_slot("z", &["a", "b"]).await.unwrap().as_deref(),
            Some("192.0.2.1")
        );
        assert_eq!(store.read_slot("y", &["a", "b"]).await.unwrap(), None);

        store.remove_slot("z", &["a", "b"]).await.unwrap();
        store.remove_slot("z", &["a", "b"]).await.unwrap();
        assert_eq!(store.read_slot("z", &["a", "b"]).await.unwrap(), None);
    }
}
