//! Watch-only wallet descriptors and collections.
//!
//! Field names match what every app release has written into backups.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PubKeyType {
    #[serde(rename = "BIP44")]
    Bip44,
    #[serde(rename = "BIP49")]
    Bip49,
    #[serde(rename = "BIP84")]
    Bip84,
    #[serde(rename = "ADDRESS")]
    Address,
}

impl PubKeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PubKeyType::Bip44 => "BIP44",
            PubKeyType::Bip49 => "BIP49",
            PubKeyType::Bip84 => "BIP84",
            PubKeyType::Address => "ADDRESS",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BIP44" => Some(PubKeyType::Bip44),
            "BIP49" => Some(PubKeyType::Bip49),
            "BIP84" => Some(PubKeyType::Bip84),
            "ADDRESS" => Some(PubKeyType::Address),
            _ => None,
        }
    }
}

/// One watched public key or address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKeyModel {
    #[serde(rename = "pubKey")]
    pub pub_key: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: Option<PubKeyType>,
    #[serde(default)]
    pub change_index: i64,
    #[serde(default)]
    pub account_index: i64,
    #[serde(rename = "fingerPrint", default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub balance: i64,
}

impl PubKeyModel {
    pub fn new(pub_key: impl Into<String>, label: impl Into<String>, kind: PubKeyType) -> Self {
        Self {
            pub_key: pub_key.into(),
            label: label.into(),
            kind: Some(kind),
            change_index: 0,
            account_index: 0,
            fingerprint: None,
            balance: 0,
        }
    }
    pub fn with_indexes(mut self, change_index: i64, account_index: i64) -> Self {
        self.change_index = change_index;
        self.account_index = account_index;
        self
    }
    pub fn with_fingerprint(mut self, fp: impl Into<String>) -> Self { self.fingerprint = Some(fp.into()); self }
}

/// A labelled group of descriptors. Unit of replace-or-merge on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKeyCollection {
    #[serde(default = "crate::core::new_id")]
    pub id: String,
    #[serde(rename = "collectionLabel", default)]
    pub label: String,
    #[serde(default)]
    pub pubs: Vec<PubKeyModel>,
    #[serde(default)]
    pub balance: i64,
    #[serde(rename = "lastRefreshed", default)]
    pub last_refreshed: i64,
    #[serde(rename = "isImportFromWallet", default)]
    pub is_import_from_wallet: bool,
}

impl PubKeyCollection {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: crate::core::new_id(),
            label: label.into(),
            pubs: Vec::new(),
            balance: 0,
            last_refreshed: 0,
            is_import_from_wallet: false,
        }
    }

    pub fn with_pubs(mut self, pubs: Vec<PubKeyModel>) -> Self { self.pubs = pubs; self }

    pub fn contains(&self, pub_key: &str) -> bool {
        self.pubs.iter().any(|p| p.pub_key == pub_key)
    }
}
