//! Dojo - remote backend pairing payload.
//!
//! A pairing payload looks like:
//!
//! ```text
//! {"pairing": {"type": "dojo.api", "version": "1.0.0",
//!              "apikey": "...", "url": "http://<onion>/v2"}}
//! ```
//!
//! Backups may carry it either as an object or as a string holding one.

use crate::core::schema::dojo as fields;
use serde_json::{Map, Value};
use std::sync::RwLock;

/// Validates a pairing payload before it is accepted from a backup.
pub trait DojoValidator: Send + Sync {
    fn validate(&self, payload: &Value) -> bool;
}

/// Checks for a `pairing` object with non-empty `url` and `apikey`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairingValidator;

impl DojoValidator for PairingValidator {
    fn validate(&self, payload: &Value) -> bool { validate_pairing(payload) }
}

pub fn validate_pairing(payload: &Value) -> bool {
    let Some(obj) = as_object(payload) else { return false };
    let Some(pairing) = obj.get(fields::PAIRING).and_then(Value::as_object) else { return false };
    let non_empty = |key: &str| pairing.get(key).and_then(Value::as_str).map(|s| !s.trim().is_empty()).unwrap_or(false);
    non_empty(fields::URL) && non_empty(fields::API_KEY)
}

/// Accept an object, or a string containing a JSON object.
pub fn as_object(payload: &Value) -> Option<Map<String, Value>> {
    match payload {
        Value::Object(obj) => Some(obj.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(obj)) => Some(obj),
            _ => None,
        },
        _ => None,
    }
}

/// Remote backend configuration store.
pub trait DojoStore: Send + Sync {
    fn is_enabled(&self) -> bool;
    /// Serialized pairing payload, if one is configured.
    fn export_payload(&self) -> Option<String>;
    fn set_dojo(&self, payload: &str) -> Result<(), String>;
}

/// In-memory [`DojoStore`].
#[derive(Debug, Default)]
pub struct MemoryDojo {
    payload: RwLock<Option<String>>,
}

impl MemoryDojo {
    pub fn new() -> Self { Self::default() }
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self { payload: RwLock::new(Some(payload.into())) }
    }
}

impl DojoStore for MemoryDojo {
    fn is_enabled(&self) -> bool {
        self.payload.read().map(|p| p.is_some()).unwrap_or(false)
    }

    fn export_payload(&self) -> Option<String> {
        self.payload.read().ok().and_then(|p| p.clone())
    }

    fn set_dojo(&self, payload: &str) -> Result<(), String> {
        let value: Value = serde_json::from_str(payload).map_err(|e| format!("dojo json: {e}"))?;
        if !validate_pairing(&value) {
            return Err("dojo payload missing pairing url/apikey".into());
        }
        *self.payload.write().map_err(|_| "dojo lock".to_string())? = Some(payload.to_string());
        Ok(())
    }
}
