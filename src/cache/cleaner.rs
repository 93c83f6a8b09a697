use std::sync::Arc;

use log::{debug, info};
use tokio::sync::watch::Receiver;

use crate::cache::BlobMemCache;

pub struct CacheCleaner {
    cache: Arc<BlobMemCache>,
    finalized_rx: Receiver<u64>,
}

impl CacheCleaner {
    pub fn new(cache: Arc<BlobMemCache>, finalized_rx: Receiver<u64>) -> Self {
        Self {
            cache,
            finalized_rx,
        }
    }

    // The value the receiver holds when handed over counts as seen, so a
    // placeholder such as 0 never evicts. Returns once the sender is dropped.
    pub async fn start(mut self) {
        while self.finalized_rx.changed().await.is_ok() {
            let finalized = *self.finalized_rx.borrow_and_update();
            self.exec_impl(finalized);
        }

        debug!("Finality notifier closed, stopping blob cache cleaner. ");
    }

    fn exec_impl(&self, finalized: u64) {
        let removed = self.cache.cleanup(finalized);
        if removed > 0 {
            info!("Block {finalized} finalized, {removed} block(s) evicted, {} still cached. ", self.cache.len());
        }
    }
}
