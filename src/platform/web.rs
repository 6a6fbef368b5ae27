//! Browser platform: LocalStorage store and `spawn_local` spawner

use futures::future::LocalFutureObj;
use futures::task::{LocalSpawn, SpawnError};

use super::KeyValueStore;
use crate::error::{StoreError, StoreResult};

/// `window.localStorage`
///
/// The storage handle is looked up on every call so a page that loses
/// storage access (private mode, quota) degrades to `Unavailable` errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> StoreResult<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::Unavailable("LocalStorage not available".to_string()))
    }
}

fn js_error(err: wasm_bindgen::JsValue) -> StoreError {
    StoreError::Unavailable(format!("{:?}", err))
}

impl KeyValueStore for LocalStorageStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Self::storage()?.get_item(key).map_err(js_error)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        Self::storage()?.set_item(key, value).map_err(js_error)
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        Self::storage()?.remove_item(key).map_err(js_error)
    }
}

/// Runs tasks on the browser's microtask queue
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSpawner;

impl LocalSpawn for WebSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}
