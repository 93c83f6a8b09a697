use std::collections::BTreeMap;

use bytes::Bytes;
use log::{debug, warn};
use parking_lot::RwLock;

use crate::{
    blobs::BlobCacheReader,
    cache::{Blob, BlockBlobs},
    error::{Error, Result},
    scheme::{sample_window, KvHash},
};

/// Blobs downloaded from peers but not yet finalized, indexed by block number.
/// Lookups scan every cached block from the newest down.
pub struct BlobMemCache {
    // None once closed
    blocks: RwLock<Option<BTreeMap<u64, BlockBlobs>>>,
    max_blocks: usize,
}

impl Default for BlobMemCache {
    fn default() -> Self {
        Self::new(0)
    }
}

impl BlobMemCache {
    // max_blocks of 0 disables fallback eviction
    pub fn new(max_blocks: usize) -> Self {
        Self {
            blocks: RwLock::new(Some(BTreeMap::new())),
            max_blocks,
        }
    }

    /// Installs the blobs of a block, replacing whatever was cached for it.
    /// Returns the block numbers dropped to stay within `max_blocks`, which
    /// may include `block` itself if it is older than everything cached.
    pub fn set_block_blobs(&self, block: BlockBlobs) -> Result<Vec<u64>> {
        let number = block.number();
        let count = block.blobs().len();
        let mut evicted = vec![];

        {
            let mut guard = self.blocks.write();
            let blocks = guard.as_mut().ok_or(Error::Closed)?;

            blocks.insert(number, block);

            if self.max_blocks > 0 {
                while blocks.len() > self.max_blocks {
                    match blocks.pop_first() {
                        Some((evicted_number, _)) => evicted.push(evicted_number),
                        None => break,
                    }
                }
            }
        }

        debug!("Cached {count} blob(s) of block {number}. ");
        if !evicted.is_empty() {
            warn!(
                "Blob cache over {} blocks without finality, evicted block(s) {evicted:?}. ",
                self.max_blocks,
            );
        }

        Ok(evicted)
    }

    pub fn blobs(&self, number: u64) -> Vec<Blob> {
        self.blocks
            .read()
            .as_ref()
            .and_then(|blocks| blocks.get(&number))
            .map(|block| block.blobs().to_vec())
            .unwrap_or_default()
    }

    pub fn get_key_value_by_index(&self, kv_index: u64, hash: &KvHash) -> Option<Bytes> {
        self.find(|blob| blob.kv_index() == kv_index && blob.hash().matches(hash))
            .map(|blob| blob.data())
    }

    pub fn get_key_value_by_index_unchecked(&self, kv_index: u64) -> Option<Bytes> {
        self.find(|blob| blob.kv_index() == kv_index).map(|blob| blob.data())
    }

    pub fn get_sample_data(&self, kv_index: u64, sample_idx_in_kv: u64) -> Result<Option<Bytes>> {
        match self.get_key_value_by_index_unchecked(kv_index) {
            Some(data) => Ok(Some(sample_window(kv_index, &data, sample_idx_in_kv)?)),
            None => Ok(None),
        }
    }

    pub fn cleanup(&self, finalized: u64) -> usize {
        let removed = {
            let mut guard = self.blocks.write();
            let Some(blocks) = guard.as_mut() else {
                return 0;
            };

            let before = blocks.len();
            blocks.retain(|number, _| *number > finalized);
            before - blocks.len()
        };

        if removed > 0 {
            debug!("Removed {removed} finalized block(s) up to {finalized} from blob cache. ");
        }

        removed
    }

    pub fn close(&self) {
        *self.blocks.write() = None;
    }

    pub fn len(&self) -> usize {
        self.blocks.read().as_ref().map(|blocks| blocks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn block_numbers(&self) -> Vec<u64> {
        self.blocks
            .read()
            .as_ref()
            .map(|blocks| blocks.keys().copied().collect())
            .unwrap_or_default()
    }

    fn find<P: Fn(&Blob) -> bool>(&self, predicate: P) -> Option<Blob> {
        let guard = self.blocks.read();
        guard
            .as_ref()?
            .values()
            .rev()
            .flat_map(|block| block.blobs().iter())
            .find(|blob| predicate(*blob))
            .cloned()
    }
}

impl BlobCacheReader for BlobMemCache {
    fn get_key_value_by_index(&self, kv_index: u64, hash: &KvHash) -> Option<Bytes> {
        BlobMemCache::get_key_value_by_index(self, kv_index, hash)
    }

    fn get_key_value_by_index_unchecked(&self, kv_index: u64) -> Option<Bytes> {
        BlobMemCache::get_key_value_by_index_unchecked(self, kv_index)
    }
}
