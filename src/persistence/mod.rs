//! Load-then-sync persistence
//!
//! Features:
//! - One value per store key, read once then written on every change
//! - Changes made before the first read completes are deferred, never dropped
//! - Last-call-wins writes (superseded writes are skipped)
//! - Pluggable codecs (text, JSON, closures)

pub mod codec;
pub mod value;

pub use codec::{Codec, FnCodec, JsonCodec, TextCodec};
pub use value::{Phase, PersistentValue, PersistentValueBuilder, SubscriptionId};
