//! Sentinel: backup codec for a watch-only Bitcoin wallet.
//!
//! Serializes watched collections, preferences and the optional Dojo pairing
//! into a versioned encrypted envelope, and restores from the three backup
//! layouts seen in the wild.
//!
//! # Architecture
//!
//! ```text
//! BackupCodec ───── Cipher (AES-256-CBC / PBKDF2)
//!   │     │
//!   │     └──────── keys::validate (xpub/ypub/zpub, addresses)
//!   │
//!   ├── CollectionStore, PrefsStore, DojoStore   (read on export)
//!   │
//!   └── Restored ──→ Importer ──→ TxStore, UtxoStore, CollectionStore,
//!                                 PrefsStore, DojoStore   (written on import)
//! ```
//!
//! # Backup layouts
//!
//! | Layout | Top-level keys | Decoder |
//! |--------|----------------|---------|
//! | Sentinel | `collections`, `prefs`, `dojo?` | `decrypt_sentinel` |
//! | Sentinel legacy | `xpubs`, `bip49`, `bip84`, `legacy`, `dojo?` | `decrypt_sentinel_legacy` |
//! | Samourai | `wallet` | `decrypt_and_parse_samourai_payload` |
//!
//! # Features
//!
//! - `native` - CLI binary and the `tracing-subscriber` log setup
//!
//! # Usage
//!
//! ```ignore
//! use sentinel::{BackupCodec, MemoryStore, MemoryPrefs, MemoryDojo};
//! use std::sync::Arc;
//!
//! let codec = BackupCodec::with_defaults(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryPrefs::new()),
//!     Arc::new(MemoryDojo::new()),
//! );
//! let envelope = codec.export("password")?;
//! let restored = codec.restore(&envelope, "password")?;
//! ```

pub mod backup;
pub mod core;
pub mod crypto;
pub mod dojo;
pub mod keys;
pub mod models;
pub mod prefs;
pub mod store;

#[cfg(feature = "native")]
pub mod logging;

pub use backup::{
    read_backup_file, BackupCodec, BackupConfig, BackupError, DeviceMeta, Envelope, ImportSummary, Importer,
    LegacyRestore, PayloadShape, Restored, SamouraiError, SentinelRestore,
};
pub use crypto::{AesCipher, Cipher, CryptoError, Scheme};
pub use dojo::{DojoStore, DojoValidator, MemoryDojo, PairingValidator};
pub use keys::validate;
pub use models::{PubKeyCollection, PubKeyModel, PubKeyType};
pub use prefs::{MemoryPrefs, PrefsStore};
pub use store::{CollectionStore, MemoryStore, StoreError, TxStore, UtxoStore};
