mod reader;

use bytes::Bytes;

use crate::scheme::KvHash;

pub use reader::BlobReader;

pub trait BlobCacheReader: Send + Sync {
    fn get_key_value_by_index(&self, kv_index: u64, hash: &KvHash) -> Option<Bytes>;
    fn get_key_value_by_index_unchecked(&self, kv_index: u64) -> Option<Bytes>;
}

// durable shard storage, reads may block on disk
pub trait StorageManager: Send + Sync {
    fn try_read(&self, kv_index: u64, read_len: usize, hash: &KvHash) -> anyhow::Result<Option<Bytes>>;

    fn read_sample_unlocked(&self, shard_index: u64, sample_index: u64) -> anyhow::Result<KvHash>;

    fn max_kv_size(&self) -> u64;

    fn max_kv_size_bits(&self) -> u32;
}
