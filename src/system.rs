use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use log::info;
use tokio::{sync::watch::Receiver, task::JoinHandle};

use crate::{
    blobs::{BlobReader, StorageManager},
    cache::{Blob, BlobMemCache, BlockBlobs, CacheCleaner},
    config::Config,
    error::Result,
    rate::{Tracker, Trackers},
    scheme::KvHash,
};

pub struct System<S> {
    pub config: Config,
    pub trackers: Arc<Trackers>,
    pub cache: Arc<BlobMemCache>,
    pub reader: BlobReader<BlobMemCache, S>,
    max_kv_size: usize,
}

impl<S: StorageManager> System<S> {
    pub fn new(config: Config, storage: Arc<S>) -> Self {
        // the storage manager owns the scheme, so cached blobs are bounded
        // by the same slot size the reader maps samples with
        let max_kv_size = storage.max_kv_size() as usize;

        let cache = Arc::new(BlobMemCache::new(config.max_cached_blocks));
        let reader = BlobReader::new(Arc::clone(&cache), storage);

        Self {
            config,
            trackers: Arc::new(Trackers::new()),
            cache,
            reader,
            max_kv_size,
        }
    }

    // new peers start from the mean capacity of the ones already tracked
    pub fn connect_peer(&self, id: &str) -> Result<()> {
        let capacity = self.trackers.mean_capacity().unwrap_or(self.config.initial_capacity);
        let tracker = Tracker::with_max_items(capacity, self.config.max_message_size);
        self.trackers.track(id, Arc::new(tracker))
    }

    pub fn disconnect_peer(&self, id: &str) -> Result<()> {
        self.trackers.untrack(id)
    }

    pub fn request_size(&self, id: &str) -> usize {
        self.trackers.capacity(id, self.config.target_rtt())
    }

    pub fn record_delivery(&self, id: &str, elapsed: Duration, items: usize) {
        self.trackers.update(id, elapsed, items)
    }

    pub fn cache_block(&self, number: u64, blobs: Vec<(u64, KvHash, Bytes)>) -> Result<Vec<u64>> {
        let blobs = blobs
            .into_iter()
            .map(|(kv_index, hash, data)| Blob::new(kv_index, hash, data, self.max_kv_size))
            .collect::<Result<Vec<_>>>()?;

        self.cache.set_block_blobs(BlockBlobs::new(number, blobs))
    }

    pub fn get_blob(&self, kv_index: u64, hash: &KvHash) -> Result<Bytes> {
        self.reader.get_blob(kv_index, hash)
    }

    pub fn read_sample(&self, shard_index: u64, sample_index: u64) -> Result<KvHash> {
        self.reader.read_sample(shard_index, sample_index)
    }

    pub fn spawn_cleaner(&self, finalized_rx: Receiver<u64>) -> JoinHandle<()> {
        info!("Starting blob cache cleaner. ");
        let cleaner = CacheCleaner::new(Arc::clone(&self.cache), finalized_rx);
        tokio::spawn(cleaner.start())
    }

    pub fn close(&self) {
        self.cache.close();
    }
}
