//! Preferences facility. Backups carry prefs as an opaque JSON object.

use serde_json::{Map, Value};
use std::sync::RwLock;

pub trait PrefsStore: Send + Sync {
    fn export(&self) -> Value;
    fn import(&self, prefs: &Value);
}

/// In-memory [`PrefsStore`]. Import merges keys over current values.
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    values: RwLock<Map<String, Value>>,
}

impl MemoryPrefs {
    pub fn new() -> Self { Self::default() }

    pub fn from_value(value: Value) -> Self {
        let values = match value { Value::Object(obj) => obj, _ => Map::new() };
        Self { values: RwLock::new(values) }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().ok().and_then(|v| v.get(key).cloned())
    }
}

impl PrefsStore for MemoryPrefs {
    fn export(&self) -> Value {
        self.values.read().map(|v| Value::Object(v.clone())).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    fn import(&self, prefs: &Value) {
        let Some(incoming) = prefs.as_object() else {
            tracing::warn!("ignoring non-object prefs");
            return;
        };
        if let Ok(mut values) = self.values.write() {
            for (k, v) in incoming {
                values.insert(k.clone(), v.clone());
            }
        }
    }
}
