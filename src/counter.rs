//! Persistent counter
//!
//! Headless model of the counter screen: the count survives restarts, is
//! saved on every change and can be wiped from storage.

use std::time::Duration;

use futures::task::LocalSpawn;
use web_time::SystemTime;

use crate::persistence::{PersistentValue, TextCodec};
use crate::platform::KeyValueStore;

/// Default store key
pub const STORAGE_KEY: &str = "@counter_value";

/// Count at which the screen celebrates
pub const MILESTONE: i64 = 10;

/// Counter backed by one store key, stored as decimal text
pub struct Counter<S> {
    value: PersistentValue<i64, S>,
}

impl<S: KeyValueStore + 'static> Counter<S> {
    /// Counter at [`STORAGE_KEY`]
    pub fn new(store: S, spawner: impl LocalSpawn + 'static) -> Self {
        Self::with_key(STORAGE_KEY, store, spawner)
    }

    /// Counter at a custom key
    pub fn with_key(key: &str, store: S, spawner: impl LocalSpawn + 'static) -> Self {
        Self::from_value(PersistentValue::initialize(
            key,
            0,
            TextCodec::new(),
            store,
            spawner,
        ))
    }

    /// Wrap an already configured value (custom error handler, codec)
    pub fn from_value(value: PersistentValue<i64, S>) -> Self {
        Self { value }
    }

    /// Add one (saturating)
    pub fn increment(&self) {
        self.value.update(|n| *n = n.saturating_add(1));
    }

    /// Subtract one (saturating)
    pub fn decrement(&self) {
        self.value.update(|n| *n = n.saturating_sub(1));
    }

    /// Back to zero, keeping a stored "0"
    pub fn reset(&self) {
        self.value.set(0);
    }

    /// Back to zero and remove the stored entry
    pub fn clear(&self) {
        self.value.clear();
    }

    /// Current count; 0 until the stored value has loaded
    pub fn count(&self) -> i64 {
        self.value.read()
    }

    /// True until the stored count has been read
    pub fn is_loading(&self) -> bool {
        !self.value.is_ready()
    }

    /// Whether the count is at or past [`MILESTONE`]
    pub fn milestone_reached(&self) -> bool {
        self.count() >= MILESTONE
    }

    /// "Saved just now" style label, `None` until the first save
    pub fn last_saved_label(&self, now: SystemTime) -> Option<String> {
        self.value
            .last_synced_at()
            .map(|saved| format_saved_at(saved, now))
    }

    /// Underlying value, for subscribing or awaiting `settled`
    pub fn value(&self) -> &PersistentValue<i64, S> {
        &self.value
    }
}

/// Format a save time relative to `now`
pub fn format_saved_at(saved: SystemTime, now: SystemTime) -> String {
    // Clock went backwards: treat as just saved
    let elapsed = now.duration_since(saved).unwrap_or(Duration::ZERO);
    let mins = elapsed.as_secs() / 60;
    let hours = mins / 60;
    let days = hours / 24;

    if days >= 1 {
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else if days < 14 {
            "1 week ago".to_string()
        } else {
            format!("{} weeks ago", days / 7)
        }
    } else if hours >= 1 {
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if mins >= 1 {
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}
