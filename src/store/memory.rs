//! MemoryStore - in-process stand-in for every storage collaborator.

use super::{CollectionStore, StoreError, StoreResult, TxStore, UtxoStore};
use crate::models::PubKeyCollection;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Vec<PubKeyCollection>>,
    txs: RwLock<Vec<Value>>,
    utxos: RwLock<Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_collections(collections: Vec<PubKeyCollection>) -> Self {
        Self { collections: RwLock::new(collections), ..Default::default() }
    }

    /// Seed cache rows. Only counted, never interpreted.
    pub fn seed_cache(&self, txs: Vec<Value>, utxos: Vec<Value>) -> StoreResult<()> {
        *self.txs.write().map_err(|_| StoreError::Lock("txs"))? = txs;
        *self.utxos.write().map_err(|_| StoreError::Lock("utxos"))? = utxos;
        Ok(())
    }

    pub fn tx_count(&self) -> usize { self.txs.read().map(|t| t.len()).unwrap_or(0) }
    pub fn utxo_count(&self) -> usize { self.utxos.read().map(|u| u.len()).unwrap_or(0) }
}

#[async_trait]
impl TxStore for MemoryStore {
    async fn delete_all(&self) -> StoreResult<()> {
        self.txs.write().map_err(|_| StoreError::Lock("txs"))?.clear();
        Ok(())
    }
}

#[async_trait]
impl UtxoStore for MemoryStore {
    async fn delete_all(&self) -> StoreResult<()> {
        self.utxos.write().map_err(|_| StoreError::Lock("utxos"))?.clear();
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    fn collections(&self) -> Vec<PubKeyCollection> {
        self.collections.read().map(|c| c.clone()).unwrap_or_default()
    }

    async fn reset(&self) -> StoreResult<()> {
        self.collections.write().map_err(|_| StoreError::Lock("collections"))?.clear();
        Ok(())
    }

    async fn add_new(&self, collection: PubKeyCollection) -> StoreResult<()> {
        let mut guard = self.collections.write().map_err(|_| StoreError::Lock("collections"))?;
        if guard.iter().any(|c| c.id == collection.id) {
            return Err(StoreError::Duplicate(collection.id));
        }
        guard.push(collection);
        Ok(())
    }
}
