//! JS bindings for the browser build
//!
//! The page renders; these calls carry its button presses into the counter.

use wasm_bindgen::prelude::*;
use web_time::SystemTime;

use crate::counter::Counter;
use crate::platform::{self, LocalStorageStore, WebSpawner};
use crate::settings::Settings;

#[wasm_bindgen]
pub struct WebCounter {
    counter: Counter<LocalStorageStore>,
}

#[wasm_bindgen]
impl WebCounter {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebCounter {
        platform::init_logging();
        let settings = Settings::load();
        WebCounter {
            counter: Counter::with_key(&settings.counter_key, LocalStorageStore::new(), WebSpawner),
        }
    }

    pub fn increment(&self) {
        self.counter.increment();
    }

    pub fn decrement(&self) {
        self.counter.decrement();
    }

    pub fn reset(&self) {
        self.counter.reset();
    }

    pub fn clear(&self) {
        self.counter.clear();
    }

    pub fn count(&self) -> f64 {
        self.counter.count() as f64
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.counter.is_loading()
    }

    #[wasm_bindgen(js_name = milestoneReached)]
    pub fn milestone_reached(&self) -> bool {
        self.counter.milestone_reached()
    }

    #[wasm_bindgen(js_name = lastSavedLabel)]
    pub fn last_saved_label(&self) -> Option<String> {
        self.counter.last_saved_label(SystemTime::now())
    }

    /// Call `callback(count)` after every change, including the initial load
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: js_sys::Function) {
        self.counter.value().subscribe(move |count| {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_f64(*count as f64)) {
                log::warn!("onChange callback failed: {:?}", err);
            }
        });
    }
}

impl Default for WebCounter {
    fn default() -> Self {
        Self::new()
    }
}
