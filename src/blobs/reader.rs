use std::sync::Arc;

use bytes::Bytes;
use log::debug;

use crate::{
    blobs::{BlobCacheReader, StorageManager},
    error::{Error, Result},
    scheme::{sample_window, KvHash, SAMPLE_SIZE_BITS},
};

pub struct BlobReader<C, S> {
    cache: Arc<C>,
    storage: Arc<S>,
}

impl<C: BlobCacheReader, S: StorageManager> BlobReader<C, S> {
    pub fn new(cache: Arc<C>, storage: Arc<S>) -> Self {
        Self { cache, storage }
    }

    pub fn get_blob(&self, kv_index: u64, hash: &KvHash) -> Result<Bytes> {
        if let Some(blob) = self.cache.get_key_value_by_index(kv_index, hash) {
            debug!("Loaded blob {kv_index} from downloader cache. ");
            return Ok(blob);
        }

        let read_len = self.storage.max_kv_size() as usize;
        match self.storage.try_read(kv_index, read_len, hash)? {
            Some(blob) => {
                debug!("Loaded blob {kv_index} from storage manager. ");
                Ok(blob)
            },
            None => Err(Error::NotFound { kv_index }),
        }
    }

    pub fn read_sample(&self, shard_index: u64, sample_index: u64) -> Result<KvHash> {
        let sample_len_bits = self.storage.max_kv_size_bits().saturating_sub(SAMPLE_SIZE_BITS);
        let kv_index = sample_index.checked_shr(sample_len_bits).unwrap_or(0);

        if let Some(blob) = self.cache.get_key_value_by_index_unchecked(kv_index) {
            debug!("Loaded sample {sample_index} of blob {kv_index} from downloader cache. ");
            let mask = 1u64.checked_shl(sample_len_bits).map_or(u64::MAX, |n| n - 1);
            let sample = sample_window(kv_index, &blob, sample_index & mask)?;
            return Ok(KvHash::from_slice(&sample));
        }

        Ok(self.storage.read_sample_unlocked(shard_index, sample_index)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;

    use super::*;
    use crate::{
        cache::{Blob, BlobMemCache, BlockBlobs},
        scheme::{HASH_LENGTH, SAMPLE_SIZE},
    };

    const MAX_KV_SIZE_BITS: u32 = 10;
    const MAX_KV_SIZE: u64 = 1 << MAX_KV_SIZE_BITS;
    const SAMPLES_PER_KV: u64 = MAX_KV_SIZE / SAMPLE_SIZE;

    #[derive(Default)]
    struct StubStorage {
        reads: AtomicUsize,
        sample_reads: AtomicUsize,
        stored: Option<(u64, Bytes)>,
        fail: bool,
    }

    impl StorageManager for StubStorage {
        fn try_read(&self, kv_index: u64, read_len: usize, _hash: &KvHash) -> anyhow::Result<Option<Bytes>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            assert_eq!(read_len, MAX_KV_SIZE as usize);

            if self.fail {
                return Err(anyhow!("disk on fire"));
            }

            Ok(self.stored.as_ref().filter(|(idx, _)| *idx == kv_index).map(|(_, data)| data.clone()))
        }

        fn read_sample_unlocked(&self, _shard_index: u64, sample_index: u64) -> anyhow::Result<KvHash> {
            self.sample_reads.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(anyhow!("disk on fire"));
            }

            Ok(KvHash::from_slice(&sample_index.to_be_bytes()))
        }

        fn max_kv_size(&self) -> u64 {
            MAX_KV_SIZE
        }

        fn max_kv_size_bits(&self) -> u32 {
            MAX_KV_SIZE_BITS
        }
    }

    fn patterned(kv_index: u64) -> Vec<u8> {
        (0..MAX_KV_SIZE).map(|i| (i as u8).wrapping_add(kv_index as u8)).collect()
    }

    fn cache_with(kv_index: u64, hash: KvHash) -> Arc<BlobMemCache> {
        let cache = Arc::new(BlobMemCache::default());
        let blob = Blob::new(kv_index, hash, patterned(kv_index), MAX_KV_SIZE as usize).unwrap();
        cache.set_block_blobs(BlockBlobs::new(100, vec![blob])).unwrap();
        cache
    }

    #[test]
    fn test_get_blob_cache_hit_skips_storage() {
        let hash = KvHash([1; HASH_LENGTH]);
        let storage = Arc::new(StubStorage::default());
        let reader = BlobReader::new(cache_with(4, hash), Arc::clone(&storage));

        let blob = reader.get_blob(4, &hash).unwrap();
        assert_eq!(blob.as_ref(), patterned(4).as_slice());
        assert_eq!(storage.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_get_blob_falls_back_once() {
        let storage = Arc::new(StubStorage {
            stored: Some((9, Bytes::from_static(b"persisted"))),
            ..Default::default()
        });
        let reader = BlobReader::new(cache_with(4, KvHash::default()), Arc::clone(&storage));

        let blob = reader.get_blob(9, &KvHash::default()).unwrap();
        assert_eq!(blob.as_ref(), b"persisted");
        assert_eq!(storage.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_blob_hash_mismatch_goes_to_storage() {
        let storage = Arc::new(StubStorage::default());
        let reader = BlobReader::new(cache_with(4, KvHash([1; HASH_LENGTH])), Arc::clone(&storage));

        let err = reader.get_blob(4, &KvHash([2; HASH_LENGTH])).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(storage.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_blob_not_found() {
        let storage = Arc::new(StubStorage::default());
        let reader = BlobReader::new(Arc::new(BlobMemCache::default()), storage);

        let err = reader.get_blob(12, &KvHash::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound { kv_index: 12 }));
    }

    #[test]
    fn test_get_blob_storage_error_propagates() {
        let storage = Arc::new(StubStorage {
            fail: true,
            ..Default::default()
        });
        let reader = BlobReader::new(Arc::new(BlobMemCache::default()), storage);

        let err = reader.get_blob(12, &KvHash::default()).unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn test_read_sample_from_cache() {
        let storage = Arc::new(StubStorage::default());
        let reader = BlobReader::new(cache_with(3, KvHash::default()), Arc::clone(&storage));

        let sample_idx_in_kv = 7;
        let sample_index = 3 * SAMPLES_PER_KV + sample_idx_in_kv;
        let hash = reader.read_sample(0, sample_index).unwrap();

        let offset = (sample_idx_in_kv * SAMPLE_SIZE) as usize;
        let expected = &patterned(3)[offset..offset + SAMPLE_SIZE as usize];
        assert_eq!(hash.as_bytes(), expected);
        assert_eq!(storage.sample_reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_read_sample_falls_back_to_storage() {
        let storage = Arc::new(StubStorage::default());
        let reader = BlobReader::new(cache_with(3, KvHash::default()), Arc::clone(&storage));

        let sample_index = 5 * SAMPLES_PER_KV + 1;
        let hash = reader.read_sample(2, sample_index).unwrap();

        assert_eq!(hash, KvHash::from_slice(&sample_index.to_be_bytes()));
        assert_eq!(storage.sample_reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_read_sample_storage_error() {
        let storage = Arc::new(StubStorage {
            fail: true,
            ..Default::default()
        });
        let reader = BlobReader::new(Arc::new(BlobMemCache::default()), storage);

        assert!(matches!(reader.read_sample(0, 1), Err(Error::Storage(_))));
    }

    #[test]
    fn test_read_sample_undersized_cached_blob() {
        let cache = Arc::new(BlobMemCache::default());
        let blob = Blob::new(1, KvHash::default(), vec![0u8; 40], MAX_KV_SIZE as usize).unwrap();
        cache.set_block_blobs(BlockBlobs::new(1, vec![blob])).unwrap();
        let reader = BlobReader::new(cache, Arc::new(StubStorage::default()));

        let err = reader.read_sample(0, SAMPLES_PER_KV + 2).unwrap_err();
        assert!(matches!(err, Error::SampleOutOfRange { kv_index: 1, .. }));
    }
}
