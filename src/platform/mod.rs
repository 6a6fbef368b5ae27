//! Platform abstraction layer
//!
//! Handles native/browser differences for:
//! - Storage (in-memory, JSON file on native, LocalStorage on web)
//! - Spawning local tasks
//! - Logging setup

pub mod memory;

#[cfg(not(target_arch = "wasm32"))]
pub mod file;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(target_arch = "wasm32")]
pub use web::{LocalStorageStore, WebSpawner};

use crate::error::StoreResult;

/// Asynchronous, durable, string-keyed string-value store.
///
/// Implementations store raw strings; encoding is the codec's job. A missing
/// key (`Ok(None)`) is distinct from a key holding an empty string.
///
/// Futures returned here are driven on a single-threaded executor and need
/// not be `Send`.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Initialise logging for the current platform
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    // A second init (tests, embedders) is not an error worth surfacing
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Initialise logging for the current platform
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
