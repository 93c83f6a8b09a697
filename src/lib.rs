//! Data-retrieval core of a storage node: per-peer throughput estimation for
//! sizing blob requests, an in-memory cache of recently downloaded blobs keyed
//! by block number, and a reader that serves the miner from that cache or from
//! durable shard storage.

pub mod blobs;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod rate;
pub mod scheme;
pub mod system;

pub use blobs::{BlobCacheReader, BlobReader, StorageManager};
pub use cache::{Blob, BlobMemCache, BlockBlobs, CacheCleaner};
pub use config::Config;
pub use error::{Error, Result};
pub use rate::{Tracker, Trackers};
pub use scheme::KvHash;
pub use system::System;
