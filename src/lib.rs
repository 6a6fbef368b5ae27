//! Persistent Value - a value that survives restarts
//!
//! Core modules:
//! - `persistence`: Load-then-sync value over one store key, codecs
//! - `platform`: Key-value stores (memory, file, LocalStorage), logging setup
//! - `counter`: Persistent counter model
//! - `settings`: Store location and key names
//! - `error`: Store, codec and error-channel types

pub mod counter;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod settings;

#[cfg(target_arch = "wasm32")]
pub mod web_api;

pub use counter::Counter;
pub use error::{CodecError, PersistError, StoreError, StoreOp};
pub use persistence::{
    Codec, FnCodec, JsonCodec, PersistentValue, PersistentValueBuilder, Phase, TextCodec,
};
pub use platform::{KeyValueStore, MemoryStore};
pub use settings::Settings;
