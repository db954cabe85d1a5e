/// Key-value storage backends for chrome.storage.local
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use wasm_bindgen::prelude::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage bridge failed: {0}")]
    Bridge(String),
    #[error("failed to (de)serialize stored value: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Async key-value store holding JSON values.
///
/// A missing key is `Ok(None)`, never an error.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }
}

/// Load and deserialize `key`, falling back to `T::default()` when it is absent
pub async fn load_or_default<S, T>(store: &S, key: &str) -> Result<T, StoreError>
where
    S: KeyValueStore,
    T: serde::de::DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(Value::Null) | None => Ok(T::default()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}

pub async fn save<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore,
    T: serde::Serialize,
{
    store.set(key, serde_json::to_value(value)?).await
}

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    #[wasm_bindgen(catch, js_name = getStorage)]
    async fn get_storage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setStorage)]
    async fn set_storage(key: &str, value: JsValue) -> Result<(), JsValue>;
}

/// chrome.storage.local, reached through the background bridge
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeStore;

impl KeyValueStore for ChromeStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let value_js = get_storage(key)
            .await
            .map_err(|e| StoreError::Bridge(format!("Failed to get {}: {:?}", key, e)))?;

        if value_js.is_null() || value_js.is_undefined() {
            return Ok(None);
        }

        serde_wasm_bindgen::from_value(value_js)
            .map(Some)
            .map_err(|e| StoreError::Bridge(format!("Failed to parse {}: {:?}", key, e)))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let value_js = serde::Serialize::serialize(&value, &serializer)
            .map_err(|e| StoreError::Bridge(format!("Failed to serialize {}: {:?}", key, e)))?;

        set_storage(key, value_js)
            .await
            .map_err(|e| StoreError::Bridge(format!("Failed to save {}: {:?}", key, e)))
    }
}

/// In-memory store that counts writes
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, Value>>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls served so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.borrow_mut().insert(key.to_string(), value);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn test_memory_store_missing_key() {
        let store = MemoryStore::new();

        assert_eq!(block_on(store.get("gameState")).unwrap(), None);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_memory_store_set_and_get() {
        let store = MemoryStore::new();

        block_on(store.set("gameState", json!({"karma": 5}))).unwrap();

        assert_eq!(block_on(store.get("gameState")).unwrap(), Some(json!({"karma": 5})));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_load_or_default_on_null() {
        let store = MemoryStore::new();
        block_on(store.set("numbers", Value::Null)).unwrap();

        let numbers: Vec<u32> = block_on(load_or_default(&store, "numbers")).unwrap();

        assert!(numbers.is_empty());
    }

    #[test]
    fn test_load_or_default_rejects_malformed_value() {
        let store = MemoryStore::new();
        block_on(store.set("numbers", json!("not a list"))).unwrap();

        let result: Result<Vec<u32>, _> = block_on(load_or_default(&store, "numbers"));

        assert!(matches!(result, Err(StoreError::Serde(_))));
    }

    #[test]
    fn test_save_round_trip() {
        let store = MemoryStore::new();

        block_on(save(&store, "numbers", &vec![1u32, 2, 3])).unwrap();
        let numbers: Vec<u32> = block_on(load_or_default(&store, "numbers")).unwrap();

        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
