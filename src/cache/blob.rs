use bytes::Bytes;

use crate::{
    error::{Error, Result},
    scheme::KvHash,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    kv_index: u64,
    hash: KvHash,
    data: Bytes,
}

impl Blob {
    pub fn new(kv_index: u64, hash: KvHash, data: impl Into<Bytes>, max_kv_size: usize) -> Result<Self> {
        let data = data.into();
        if data.len() > max_kv_size {
            return Err(Error::BlobTooLarge {
                kv_index,
                len: data.len(),
                max: max_kv_size,
            });
        }

        Ok(Self { kv_index, hash, data })
    }

    pub fn kv_index(&self) -> u64 {
        self.kv_index
    }

    pub fn hash(&self) -> &KvHash {
        &self.hash
    }

    pub fn data(&self) -> Bytes {
        self.data.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockBlobs {
    number: u64,
    blobs: Vec<Blob>,
}

impl BlockBlobs {
    pub fn new(number: u64, blobs: Vec<Blob>) -> Self {
        Self { number, blobs }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }
}
