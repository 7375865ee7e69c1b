//! Backup - versioned encrypted export and multi-format restore.
//!
//! # Architecture
//!
//! ```text
//! BackupCodec (encode + decode, collaborators injected)
//!   │
//!   ├── export:  make_payload ──→ Cipher::encrypt ──→ add_version_info ──→ envelope
//!   │
//!   └── restore: envelope ──→ Scheme::for_version ──→ Cipher::decrypt
//!                                                        │
//!                                                PayloadShape::detect
//!                                     ┌──────────────────┼──────────────────┐
//!                               parse_sentinel     parse_legacy      parse_samourai
//!
//! Importer (async, stores injected) applies a Restored to the stores.
//! ```
//!
//! # Error policy per format
//!
//! | Decoder | On failure |
//! |---------|------------|
//! | `decrypt_sentinel` | `Err(BackupError)` |
//! | `decrypt_sentinel_legacy` | `Err(BackupError)`; mismatched keys and bad `dojo` are dropped |
//! | `decrypt_and_parse_samourai_payload` | `None` (cause logged at debug) |
//! | `restore` | `Err(BackupError)` for every format |

mod codec;
mod config;
mod import;
mod parse;

pub use codec::{read_backup_file, BackupCodec, DeviceMeta};
pub use config::BackupConfig;
pub use import::{ImportSummary, Importer};
pub use parse::{parse_legacy, parse_samourai, parse_sentinel, PayloadShape};

use crate::core::schema::envelope as fields;
use crate::crypto::CryptoError;
use crate::models::{PubKeyCollection, PubKeyModel};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Invalid payload")]
    InvalidPayload,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field: {0}")]
    InvalidField(&'static str),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decrypt: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Samourai backup: {0}")]
    Samourai(#[from] SamouraiError),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for BackupError {
    fn from(e: StoreError) -> Self { BackupError::Import(e.to_string()) }
}

/// Why a Samourai export was rejected. Never crosses
/// `decrypt_and_parse_samourai_payload`, which only reports `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SamouraiError {
    #[error("backup is not a JSON envelope with a payload")]
    Envelope,

    #[error("decrypt failed: {0}")]
    Decrypt(#[from] CryptoError),

    #[error("plaintext is not JSON: {0}")]
    NotJson(String),

    #[error("no wallet object")]
    MissingWallet,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid field: {0}")]
    InvalidField(&'static str),
}

/// Outer `{version, time, payload}` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: i64,
    #[serde(default)]
    pub time: i64,
    pub payload: String,
}

impl Envelope {
    /// Requires `payload` and `version`; anything missing is `InvalidPayload`.
    pub fn parse(text: &str) -> Result<Self, BackupError> {
        let value: Value = serde_json::from_str(text)?;
        let obj = value.as_object().ok_or(BackupError::InvalidPayload)?;
        let (Some(payload), Some(version)) = (obj.get(fields::PAYLOAD), obj.get(fields::VERSION)) else {
            return Err(BackupError::InvalidPayload);
        };
        let payload = payload.as_str().ok_or(BackupError::InvalidField(fields::PAYLOAD))?.to_string();
        let version = as_int(version).ok_or(BackupError::InvalidField(fields::VERSION))?;
        let time = obj.get(fields::TIME).and_then(as_int).unwrap_or(0);
        Ok(Self { version, time, payload })
    }
}

/// Integer, an integral float (`1.0`), or a string holding an integer.
pub(crate) fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decoded current-format backup. Apply all of it or none of it.
#[derive(Debug, Clone, PartialEq)]
pub struct SentinelRestore {
    pub collections: Vec<PubKeyCollection>,
    pub prefs: Value,
    pub dojo: Option<Value>,
}

/// Decoded flat legacy backup.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRestore {
    pub pub_keys: Vec<PubKeyModel>,
    pub dojo: Option<Value>,
}

impl LegacyRestore {
    /// Wrap the flat key list into a single collection.
    pub fn into_collection(self, label: impl Into<String>) -> PubKeyCollection {
        PubKeyCollection::new(label).with_pubs(self.pub_keys)
    }
}

/// Result of shape-detecting restore.
#[derive(Debug, Clone, PartialEq)]
pub enum Restored {
    Sentinel(SentinelRestore),
    Legacy(LegacyRestore),
    Samourai(PubKeyCollection),
}

impl Restored {
    pub fn shape(&self) -> PayloadShape {
        match self {
            Restored::Sentinel(_) => PayloadShape::Sentinel,
            Restored::Legacy(_) => PayloadShape::Legacy,
            Restored::Samourai(_) => PayloadShape::Samourai,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parse() {
        let env = Envelope::parse(r#"{"version": 2, "time": 1700000000000, "payload": "abc"}"#).unwrap();
        assert_eq!(env, Envelope { version: 2, time: 1_700_000_000_000, payload: "abc".into() });
    }

    #[test]
    fn test_envelope_string_version_and_missing_time() {
        let env = Envelope::parse(r#"{"version": "1", "payload": "abc"}"#).unwrap();
        assert_eq!((env.version, env.time), (1, 0));
    }

    #[test]
    fn test_envelope_integral_float_version() {
        let env = Envelope::parse(r#"{"version": 1.0, "time": 1.7e12, "payload": "abc"}"#).unwrap();
        assert_eq!((env.version, env.time), (1, 1_700_000_000_000));
        assert!(matches!(
            Envelope::parse(r#"{"version": 1.5, "payload": "abc"}"#),
            Err(BackupError::InvalidField("version"))
        ));
    }

    #[test]
    fn test_envelope_missing_keys() {
        assert!(matches!(Envelope::parse(r#"{"payload": "abc"}"#), Err(BackupError::InvalidPayload)));
        assert!(matches!(Envelope::parse(r#"{"version": 1}"#), Err(BackupError::InvalidPayload)));
        assert!(matches!(Envelope::parse("[]"), Err(BackupError::InvalidPayload)));
        assert!(matches!(Envelope::parse("nope"), Err(BackupError::Json(_))));
    }

    #[test]
    fn test_envelope_wrong_types() {
        assert!(matches!(
            Envelope::parse(r#"{"version": "two", "payload": "abc"}"#),
            Err(BackupError::InvalidField("version"))
        ));
        assert!(matches!(
            Envelope::parse(r#"{"version": 1, "payload": 5}"#),
            Err(BackupError::InvalidField("payload"))
        ));
    }
}
