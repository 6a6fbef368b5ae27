//! In-process key-value store
//!
//! Handles are cheap clones over shared state, so a test (or an embedder)
//! can keep one handle to inspect the map while a value owns another.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::KeyValueStore;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct Shared {
    entries: RefCell<BTreeMap<String, String>>,
    offline: Cell<bool>,
}

/// Map-backed store with an offline switch
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Rc<Shared>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        store
            .shared
            .entries
            .borrow_mut()
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        store
    }

    /// While offline every operation fails with [`StoreError::Unavailable`]
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.set(offline);
    }

    pub fn is_offline(&self) -> bool {
        self.shared.offline.get()
    }

    /// Current value under `key`, bypassing the offline switch
    pub fn peek(&self, key: &str) -> Option<String> {
        self.shared.entries.borrow().get(key).cloned()
    }

    /// Copy of every entry, bypassing the offline switch
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.shared.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.shared.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.entries.borrow().is_empty()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.is_offline() {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_online()?;
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_online()?;
        self.shared
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.check_online()?;
        self.shared.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_missing_key_is_distinct_from_empty_value() {
        let store = MemoryStore::with_entries([("empty", "")]);
        assert_eq!(block_on(store.get("empty")).unwrap(), Some(String::new()));
        assert_eq!(block_on(store.get("missing")).unwrap(), None);
    }

    #[test]
    fn test_last_write_wins_and_remove() {
        let store = MemoryStore::new();
        block_on(store.set("k", "1")).unwrap();
        block_on(store.set("k", "2")).unwrap();
        assert_eq!(store.peek("k").as_deref(), Some("2"));

        block_on(store.remove("k")).unwrap();
        assert!(store.is_empty());
        // Removing again is fine
        block_on(store.remove("k")).unwrap();
    }

    #[test]
    fn test_offline_fails_every_operation() {
        let store = MemoryStore::with_entries([("k", "v")]);
        let handle = store.clone();
        handle.set_offline(true);

        assert!(matches!(
            block_on(store.get("k")),
            Err(StoreError::Unavailable(_))
        ));
        assert!(block_on(store.set("k", "w")).is_err());
        assert!(block_on(store.remove("k")).is_err());
        // Shared state untouched
        assert_eq!(handle.peek("k").as_deref(), Some("v"));

        handle.set_offline(false);
        assert_eq!(block_on(store.get("k")).unwrap().as_deref(), Some("v"));
    }
}
