//! Importer - apply a decoded backup to the stores.
//!
//! Work here is I/O bound and meant to run on the async runtime, never on an
//! interactive thread. Inserts are independent: a failure midway leaves the
//! earlier inserts in place, and so does cancelling the future.

use super::{BackupError, Restored, SentinelRestore};
use crate::dojo::DojoStore;
use crate::models::PubKeyCollection;
use crate::prefs::PrefsStore;
use crate::store::{CollectionStore, TxStore, UtxoStore};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// What [`Importer::apply`] wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub collections: usize,
    pub pub_keys: usize,
    pub prefs: bool,
    pub dojo: bool,
    pub replaced: bool,
}

pub struct Importer {
    txs: Arc<dyn TxStore>,
    utxos: Arc<dyn UtxoStore>,
    collections: Arc<dyn CollectionStore>,
    prefs: Arc<dyn PrefsStore>,
    dojo: Arc<dyn DojoStore>,
    legacy_label: String,
}

impl Importer {
    pub fn new(
        txs: Arc<dyn TxStore>,
        utxos: Arc<dyn UtxoStore>,
        collections: Arc<dyn CollectionStore>,
        prefs: Arc<dyn PrefsStore>,
        dojo: Arc<dyn DojoStore>,
    ) -> Self {
        Self {
            txs,
            utxos,
            collections,
            prefs,
            dojo,
            legacy_label: crate::core::schema::labels::LEGACY_COLLECTION.to_string(),
        }
    }

    pub fn with_legacy_label(mut self, label: impl Into<String>) -> Self { self.legacy_label = label.into(); self }

    /// With `replace`, wipe tx/utxo caches and the collection store first.
    pub async fn start_import_collections(&self, collections: Vec<PubKeyCollection>, replace: bool) -> Result<(), BackupError> {
        if replace {
            self.utxos.delete_all().await?;
            self.txs.delete_all().await?;
            self.collections.reset().await?;
        }
        let count = collections.len();
        for collection in collections {
            self.collections.add_new(collection).await?;
        }
        info!(count, replace, "collections imported");
        Ok(())
    }

    pub async fn import_dojo(&self, dojo: &Value) -> Result<(), BackupError> {
        self.dojo.set_dojo(&dojo.to_string()).map_err(BackupError::Import)
    }

    pub fn import_prefs(&self, prefs: &Value) {
        self.prefs.import(prefs);
    }

    /// Apply a whole restore: collections, then prefs, then dojo.
    pub async fn apply(&self, restored: Restored, replace: bool) -> Result<ImportSummary, BackupError> {
        let (collections, prefs, dojo) = match restored {
            Restored::Sentinel(SentinelRestore { collections, prefs, dojo }) => (collections, Some(prefs), dojo),
            Restored::Legacy(mut legacy) => {
                let dojo = legacy.dojo.take();
                (vec![legacy.into_collection(self.legacy_label.clone())], None, dojo)
            }
            Restored::Samourai(collection) => (vec![collection], None, None),
        };

        let mut summary = ImportSummary {
            collections: collections.len(),
            pub_keys: collections.iter().map(|c| c.pubs.len()).sum(),
            replaced: replace,
            ..Default::default()
        };
        self.start_import_collections(collections, replace).await?;

        if let Some(prefs) = prefs {
            self.import_prefs(&prefs);
            summary.prefs = true;
        }
        if let Some(dojo) = dojo {
            match self.import_dojo(&dojo).await {
                Ok(()) => summary.dojo = true,
                Err(e) => warn!(error = %e, "dojo settings not restored"),
            }
        }
        Ok(summary)
    }
}
