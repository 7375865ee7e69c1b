//! Field and label constants for backup payloads
//!
//! Centralized registry for every JSON key the codec reads or writes.
//! Older app releases depend on these names, so never rename one.

/// Envelope keys: `{version, time, payload}`
pub mod envelope {
    pub const VERSION: &str = "version";
    pub const TIME: &str = "time";
    pub const PAYLOAD: &str = "payload";
}

/// Current Sentinel export
pub mod sentinel {
    pub const COLLECTIONS: &str = "collections";
    pub const PREFS: &str = "prefs";
    pub const DOJO: &str = "dojo";
    pub const META: &str = "meta";
    pub const LAST_REFRESHED: &str = "lastRefreshed";
}

/// Support backup device metadata
pub mod meta {
    pub const VERSION_NAME: &str = "version_name";
    pub const ANDROID_RELEASE: &str = "android_release";
    pub const DEVICE_MANUFACTURER: &str = "device_manufacturer";
    pub const DEVICE_MODEL: &str = "device_model";
    pub const DEVICE_PRODUCT: &str = "device_product";
}

/// Flat legacy Sentinel export
pub mod legacy {
    pub const XPUBS: &str = "xpubs";
    pub const BIP49: &str = "bip49";
    pub const BIP84: &str = "bip84";
    pub const LEGACY: &str = "legacy";

    pub const ALL: &[&str] = &[XPUBS, BIP49, BIP84, LEGACY];
}

/// Samourai Wallet export
pub mod samourai {
    pub const WALLET: &str = "wallet";
    pub const FINGERPRINT: &str = "fingerprint";
    pub const ACCOUNTS: &str = "accounts";
    pub const BIP49_ACCOUNTS: &str = "bip49_accounts";
    pub const BIP84_ACCOUNTS: &str = "bip84_accounts";
    pub const WHIRLPOOL_ACCOUNT: &str = "whirlpool_account";

    pub const XPUB: &str = "xpub";
    pub const YPUB: &str = "ypub";
    pub const ZPUB: &str = "zpub";
    pub const CHANGE_IDX: &str = "changeIdx";
    pub const RECEIVE_IDX: &str = "receiveIdx";
}

/// Labels assigned to imported descriptors
pub mod labels {
    pub const SAMOURAI_COLLECTION: &str = "My Samourai wallet";
    pub const LEGACY_COLLECTION: &str = "Sentinel legacy backup";
    pub const DEPOSIT_BIP44: &str = "Deposit BIP44 PUB";
    pub const DEPOSIT_BIP49: &str = "Deposit BIP49 PUB";
    pub const DEPOSIT_BIP84: &str = "Deposit BIP84 PUB";
    pub const PREMIX: &str = "Premix PUB";
    pub const POSTMIX: &str = "Postmix PUB";
    pub const BAD_BANK: &str = "Bad Bank PUB";

    /// Label for the whirlpool account at `index`.
    pub fn whirlpool(index: usize) -> String {
        match index {
            0 => PREMIX.to_string(),
            1 => POSTMIX.to_string(),
            2 => BAD_BANK.to_string(),
            n => format!("Whirlpool {n}"),
        }
    }
}

/// Remote-backend (Dojo) pairing payload
pub mod dojo {
    pub const PAIRING: &str = "pairing";
    pub const URL: &str = "url";
    pub const API_KEY: &str = "apikey";
}
