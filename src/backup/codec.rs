//! BackupCodec - builds and opens backup envelopes.

use super::parse::{parse_legacy, parse_samourai, parse_sentinel, PayloadShape};
use super::{BackupConfig, BackupError, Envelope, LegacyRestore, Restored, SamouraiError, SentinelRestore};
use crate::core::schema::{envelope, meta, sentinel};
use crate::crypto::{AesCipher, Cipher, Scheme};
use crate::dojo::{DojoStore, DojoValidator, PairingValidator};
use crate::models::PubKeyCollection;
use crate::prefs::PrefsStore;
use crate::store::CollectionStore;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Device details embedded in support backups.
#[derive(Debug, Clone, Default)]
pub struct DeviceMeta {
    pub release: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub product: Option<String>,
}

impl DeviceMeta {
    /// Best effort description of the machine we run on.
    pub fn host() -> Self {
        Self {
            release: Some(std::env::consts::OS.to_string()),
            manufacturer: None,
            model: Some(std::env::consts::ARCH.to_string()),
            product: Some(env!("CARGO_PKG_NAME").to_string()),
        }
    }
}

pub struct BackupCodec {
    config: BackupConfig,
    cipher: Arc<dyn Cipher>,
    collections: Arc<dyn CollectionStore>,
    prefs: Arc<dyn PrefsStore>,
    dojo: Arc<dyn DojoStore>,
    dojo_validator: Arc<dyn DojoValidator>,
}

impl BackupCodec {
    pub fn new(
        config: BackupConfig,
        cipher: Arc<dyn Cipher>,
        collections: Arc<dyn CollectionStore>,
        prefs: Arc<dyn PrefsStore>,
        dojo: Arc<dyn DojoStore>,
    ) -> Self {
        Self { config, cipher, collections, prefs, dojo, dojo_validator: Arc::new(PairingValidator) }
    }

    /// AES cipher and default config.
    pub fn with_defaults(
        collections: Arc<dyn CollectionStore>,
        prefs: Arc<dyn PrefsStore>,
        dojo: Arc<dyn DojoStore>,
    ) -> Self {
        Self::new(BackupConfig::default(), Arc::new(AesCipher::new()), collections, prefs, dojo)
    }

    pub fn with_dojo_validator(mut self, v: Arc<dyn DojoValidator>) -> Self { self.dojo_validator = v; self }

    pub fn config(&self) -> &BackupConfig { &self.config }

    // ---------------------------------------------------------------------
    // Encode
    // ---------------------------------------------------------------------

    /// Plaintext `{collections, prefs, dojo?}` from the current state.
    pub fn make_payload(&self) -> Result<Value, BackupError> {
        let mut payload = Map::new();
        payload.insert(sentinel::COLLECTIONS.into(), serde_json::to_value(self.collections.collections())?);
        payload.insert(sentinel::PREFS.into(), self.prefs.export());
        if let Some(dojo) = self.exportable_dojo() {
            payload.insert(sentinel::DOJO.into(), dojo);
        }
        Ok(Value::Object(payload))
    }

    fn exportable_dojo(&self) -> Option<Value> {
        if !self.dojo.is_enabled() {
            return None;
        }
        let raw = self.dojo.export_payload()?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(v @ Value::Object(_)) => Some(v),
            _ => {
                warn!("dojo payload is not a JSON object, leaving it out of the backup");
                None
            }
        }
    }

    /// Payload for support requests: no `lastRefreshed`, plus device `meta`.
    pub fn make_support_backup(&self, device: &DeviceMeta) -> Result<Value, BackupError> {
        let mut payload = self.make_payload()?;
        if let Some(collections) = payload.get_mut(sentinel::COLLECTIONS).and_then(Value::as_array_mut) {
            for c in collections.iter_mut().filter_map(Value::as_object_mut) {
                c.remove(sentinel::LAST_REFRESHED);
            }
        }
        let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();
        let mut info = Map::new();
        info.insert(meta::VERSION_NAME.into(), json!(self.config.version_name));
        info.insert(meta::ANDROID_RELEASE.into(), json!(or_empty(&device.release)));
        info.insert(meta::DEVICE_MANUFACTURER.into(), json!(or_empty(&device.manufacturer)));
        info.insert(meta::DEVICE_MODEL.into(), json!(or_empty(&device.model)));
        info.insert(meta::DEVICE_PRODUCT.into(), json!(or_empty(&device.product)));
        if let Value::Object(obj) = &mut payload {
            obj.insert(sentinel::META.into(), Value::Object(info));
        }
        Ok(payload)
    }

    /// Wrap already-encrypted `content` as `{version, time, payload}`.
    pub fn add_version_info(&self, content: &str) -> Value {
        json!({
            (envelope::VERSION): self.config.version_code,
            (envelope::TIME): crate::core::now_millis(),
            (envelope::PAYLOAD): content,
        })
    }

    /// Full export: payload, encrypted for the configured version, wrapped.
    pub fn export(&self, password: &str) -> Result<String, BackupError> {
        let payload = self.make_payload()?;
        let (scheme, iterations) = self.config.scheme_for(self.config.version_code);
        let ciphertext = self.cipher.encrypt(&serde_json::to_string(&payload)?, password, scheme, iterations)?;
        info!(version = self.config.version_code, scheme = scheme.as_str(), "backup exported");
        Ok(self.add_version_info(&ciphertext).to_string())
    }

    // ---------------------------------------------------------------------
    // Decode
    // ---------------------------------------------------------------------

    fn open_envelope(
        &self,
        backup: &str,
        password: &str,
        pairing: impl Fn(&BackupConfig, i64) -> (Scheme, u32),
    ) -> Result<(Envelope, Value), BackupError> {
        let env = Envelope::parse(backup)?;
        let (scheme, iterations) = pairing(&self.config, env.version);
        debug!(version = env.version, scheme = scheme.as_str(), iterations, "decrypting backup");
        let plaintext = self.cipher.decrypt(&env.payload, password, scheme, iterations)?;
        Ok((env, serde_json::from_str(&plaintext)?))
    }

    /// Current Sentinel format. Every failure is returned to the caller.
    pub fn decrypt_sentinel(&self, backup: &str, password: &str) -> Result<SentinelRestore, BackupError> {
        let (_, plaintext) = self.open_envelope(backup, password, BackupConfig::scheme_for)?;
        parse_sentinel(&plaintext)
    }

    /// Flat legacy Sentinel format. Mismatched keys and invalid `dojo` are dropped.
    ///
    /// These backups were written with the legacy iteration count for every
    /// version; only the PRF follows the version.
    pub fn decrypt_sentinel_legacy(&self, backup: &str, password: &str) -> Result<LegacyRestore, BackupError> {
        let (_, plaintext) = self.open_envelope(backup, password, BackupConfig::legacy_scheme_for)?;
        self.parse_legacy(&plaintext)
    }

    fn parse_legacy(&self, plaintext: &Value) -> Result<LegacyRestore, BackupError> {
        parse_legacy(plaintext, self.dojo_validator.as_ref(), self.config.legacy_addresses)
    }

    /// Samourai Wallet export. `None` on any failure.
    pub fn decrypt_and_parse_samourai_payload(&self, backup: &str, password: &str) -> Option<PubKeyCollection> {
        match self.try_samourai(backup, password) {
            Ok(collection) => Some(collection),
            Err(e) => {
                debug!(error = %e, "samourai backup rejected");
                None
            }
        }
    }

    /// Typed form of [`Self::decrypt_and_parse_samourai_payload`].
    pub fn try_samourai(&self, backup: &str, password: &str) -> Result<PubKeyCollection, SamouraiError> {
        let outer: Value = serde_json::from_str(backup).map_err(|_| SamouraiError::Envelope)?;
        let payload = outer.get(envelope::PAYLOAD).and_then(Value::as_str).ok_or(SamouraiError::Envelope)?;
        let plaintext = self.cipher.decrypt(payload, password, Scheme::Legacy, self.config.legacy_iterations)?;
        let plaintext: Value = serde_json::from_str(&plaintext).map_err(|e| SamouraiError::NotJson(e.to_string()))?;
        parse_samourai(&plaintext, &self.config.samourai_label)
    }

    /// Decrypt, detect the shape, dispatch to its parser.
    ///
    /// The payload shape is unknown until decrypted, so every scheme pairing
    /// a known writer used for this version is tried in turn (see
    /// [`BackupConfig::candidate_schemes`]). The first error is reported when
    /// none of them opens the payload.
    pub fn restore(&self, backup: &str, password: &str) -> Result<Restored, BackupError> {
        let env = Envelope::parse(backup)?;
        let plaintext = self.decrypt_any(&env, password)?;

        let shape = PayloadShape::detect(&plaintext).ok_or(BackupError::InvalidPayload)?;
        info!(shape = shape.as_str(), version = env.version, "backup decrypted");
        Ok(match shape {
            PayloadShape::Sentinel => Restored::Sentinel(parse_sentinel(&plaintext)?),
            PayloadShape::Legacy => Restored::Legacy(self.parse_legacy(&plaintext)?),
            PayloadShape::Samourai => Restored::Samourai(parse_samourai(&plaintext, &self.config.samourai_label)?),
        })
    }

    fn decrypt_any(&self, env: &Envelope, password: &str) -> Result<Value, BackupError> {
        let mut first_err = None;
        for (scheme, iterations) in self.config.candidate_schemes(env.version) {
            let attempt = self
                .cipher
                .decrypt(&env.payload, password, scheme, iterations)
                .map_err(BackupError::from)
                .and_then(|plaintext| Ok(serde_json::from_str::<Value>(&plaintext)?));
            match attempt {
                Ok(plaintext) => return Ok(plaintext),
                Err(e) => {
                    debug!(error = %e, scheme = scheme.as_str(), iterations, "scheme failed");
                    first_err.get_or_insert(e);
                }
            }
        }
        Err(first_err.unwrap_or(BackupError::InvalidPayload))
    }
}

/// Read a backup file as text.
pub fn read_backup_file(path: impl AsRef<Path>) -> Result<String, BackupError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    Ok(text.trim().to_string())
}
