//! Pure parsers for decrypted backup plaintext. No crypto, no stores.

use super::{as_int, BackupError, LegacyRestore, SamouraiError, SentinelRestore};
use crate::core::schema::{labels, legacy, samourai, sentinel};
use crate::dojo::{as_object, DojoValidator};
use crate::keys;
use crate::models::{PubKeyCollection, PubKeyModel, PubKeyType};
use serde_json::{Map, Value};
use tracing::debug;

/// Which of the three known plaintext layouts a payload uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{collections, prefs, dojo?}`
    Sentinel,
    /// `{xpubs?, bip49?, bip84?, legacy?, dojo?}`
    Legacy,
    /// `{wallet: {...}}`
    Samourai,
}

impl PayloadShape {
    /// Sniff top-level keys. `collections` wins over `wallet`, which wins over
    /// the flat legacy arrays.
    pub fn detect(plaintext: &Value) -> Option<Self> {
        let obj = plaintext.as_object()?;
        if obj.contains_key(sentinel::COLLECTIONS) {
            Some(PayloadShape::Sentinel)
        } else if obj.contains_key(samourai::WALLET) {
            Some(PayloadShape::Samourai)
        } else if legacy::ALL.iter().any(|k| obj.contains_key(*k)) {
            Some(PayloadShape::Legacy)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadShape::Sentinel => "sentinel",
            PayloadShape::Legacy => "legacy",
            PayloadShape::Samourai => "samourai",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sentinel" => Some(PayloadShape::Sentinel),
            "legacy" => Some(PayloadShape::Legacy),
            "samourai" => Some(PayloadShape::Samourai),
            _ => None,
        }
    }
}

pub fn parse_sentinel(plaintext: &Value) -> Result<SentinelRestore, BackupError> {
    let obj = plaintext.as_object().ok_or(BackupError::InvalidPayload)?;

    let collections = obj.get(sentinel::COLLECTIONS).ok_or(BackupError::MissingField(sentinel::COLLECTIONS))?;
    if !collections.is_array() {
        return Err(BackupError::InvalidField(sentinel::COLLECTIONS));
    }
    let collections: Vec<PubKeyCollection> = serde_json::from_value(collections.clone())?;

    let prefs = obj.get(sentinel::PREFS).ok_or(BackupError::MissingField(sentinel::PREFS))?;
    if !prefs.is_object() {
        return Err(BackupError::InvalidField(sentinel::PREFS));
    }

    // Absent means no Dojo; present must be an object, `null` included.
    let dojo = match obj.get(sentinel::DOJO) {
        None => None,
        Some(v @ Value::Object(_)) => Some(v.clone()),
        Some(_) => return Err(BackupError::InvalidField(sentinel::DOJO)),
    };

    Ok(SentinelRestore { collections, prefs: prefs.clone(), dojo })
}

/// Flat arrays of `{key: label}` objects. A key whose own prefix disagrees
/// with the array it sits in is dropped, not reported.
///
/// [`keys::validate`] gives plain addresses no type, so the `legacy` array
/// only yields entries when `include_addresses` is set.
pub fn parse_legacy(
    plaintext: &Value,
    dojo_validator: &dyn DojoValidator,
    include_addresses: bool,
) -> Result<LegacyRestore, BackupError> {
    let obj = plaintext.as_object().ok_or(BackupError::InvalidPayload)?;

    let mut pub_keys = Vec::new();
    for (field, expected) in [
        (legacy::XPUBS, PubKeyType::Bip44),
        (legacy::BIP49, PubKeyType::Bip49),
        (legacy::BIP84, PubKeyType::Bip84),
        (legacy::LEGACY, PubKeyType::Address),
    ] {
        let Some(entries) = obj.get(field) else { continue };
        let entries = entries.as_array().ok_or(BackupError::InvalidField(field))?;
        for entry in entries {
            let entry = entry.as_object().ok_or(BackupError::InvalidField(field))?;
            for (key, label) in entry {
                let kind = match keys::validate(key) {
                    None if include_addresses => keys::address_type(key),
                    kind => kind,
                };
                if kind != Some(expected) {
                    debug!(array = field, expected = expected.as_str(), "dropping mismatched legacy key");
                    continue;
                }
                pub_keys.push(PubKeyModel::new(keys::normalize(key), label_text(label), expected));
            }
        }
    }

    let dojo = match obj.get(sentinel::DOJO) {
        Some(raw) if dojo_validator.validate(raw) => as_object(raw).map(Value::Object),
        Some(_) => {
            debug!("legacy backup dojo payload failed validation, skipping");
            None
        }
        None => None,
    };

    Ok(LegacyRestore { pub_keys, dojo })
}

fn label_text(label: &Value) -> String {
    match label {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Samourai Wallet export: one wallet, four account arrays.
pub fn parse_samourai(plaintext: &Value, collection_label: &str) -> Result<PubKeyCollection, SamouraiError> {
    let wallet = plaintext
        .get(samourai::WALLET)
        .ok_or(SamouraiError::MissingWallet)?
        .as_object()
        .ok_or(SamouraiError::InvalidField(samourai::WALLET))?;
    let fingerprint = match wallet.get(samourai::FINGERPRINT) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(SamouraiError::InvalidField(samourai::FINGERPRINT)),
        None => return Err(SamouraiError::MissingField(samourai::FINGERPRINT)),
    };

    let mut collection = PubKeyCollection::new(collection_label);
    collection.is_import_from_wallet = true;

    let groups: [(&'static str, &'static str, PubKeyType); 4] = [
        (samourai::ACCOUNTS, samourai::XPUB, PubKeyType::Bip44),
        (samourai::BIP49_ACCOUNTS, samourai::YPUB, PubKeyType::Bip49),
        (samourai::BIP84_ACCOUNTS, samourai::ZPUB, PubKeyType::Bip84),
        (samourai::WHIRLPOOL_ACCOUNT, samourai::ZPUB, PubKeyType::Bip84),
    ];
    for (field, key_name, kind) in groups {
        for (index, account) in account_array(wallet, field)?.iter().enumerate() {
            let account = account.as_object().ok_or(SamouraiError::InvalidField(field))?;
            let Some(key) = account.get(key_name) else { continue };
            let key = key.as_str().ok_or(SamouraiError::InvalidField(key_name))?;
            if !keys::is_valid_xpub(key) {
                debug!(account = field, index, "skipping invalid extended key");
                continue;
            }
            let label = match field {
                samourai::ACCOUNTS => labels::DEPOSIT_BIP44.to_string(),
                samourai::BIP49_ACCOUNTS => labels::DEPOSIT_BIP49.to_string(),
                samourai::BIP84_ACCOUNTS => labels::DEPOSIT_BIP84.to_string(),
                _ => labels::whirlpool(index),
            };
            let model = PubKeyModel::new(key, label, kind)
                .with_indexes(index_field(account, samourai::CHANGE_IDX)?, index_field(account, samourai::RECEIVE_IDX)?)
                .with_fingerprint(fingerprint.clone());
            collection.pubs.push(model);
        }
    }
    Ok(collection)
}

fn account_array<'a>(wallet: &'a Map<String, Value>, field: &'static str) -> Result<&'a [Value], SamouraiError> {
    match wallet.get(field) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(SamouraiError::InvalidField(field)),
    }
}

/// Absent → 0. Present but not an integer is an error.
fn index_field(account: &Map<String, Value>, field: &'static str) -> Result<i64, SamouraiError> {
    match account.get(field) {
        None => Ok(0),
        Some(v) => as_int(v).ok_or(SamouraiError::InvalidField(field)),
    }
}
