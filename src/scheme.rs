use std::fmt;

use bytes::Bytes;
use data_encoding::HEXLOWER;

use crate::error::{Error, Result};

pub const SAMPLE_SIZE_BITS: u32 = 5;
pub const SAMPLE_SIZE: u64 = 1 << SAMPLE_SIZE_BITS;

// leading hash bytes the storage contract verifies
pub const HASH_SIZE_IN_CONTRACT: usize = 24;

pub const HASH_LENGTH: usize = 32;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KvHash(pub [u8; HASH_LENGTH]);

impl KvHash {
    // right-aligned, keeping the last 32 bytes of longer input
    pub fn from_slice(b: &[u8]) -> Self {
        let mut hash = [0u8; HASH_LENGTH];
        let b = if b.len() > HASH_LENGTH { &b[b.len() - HASH_LENGTH..] } else { b };
        hash[HASH_LENGTH - b.len()..].copy_from_slice(b);
        Self(hash)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn matches(&self, other: &KvHash) -> bool {
        self.0[..HASH_SIZE_IN_CONTRACT] == other.0[..HASH_SIZE_IN_CONTRACT]
    }
}

impl From<[u8; HASH_LENGTH]> for KvHash {
    fn from(value: [u8; HASH_LENGTH]) -> Self {
        Self(value)
    }
}

impl fmt::Display for KvHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", HEXLOWER.encode(&self.0))
    }
}

impl fmt::Debug for KvHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KvHash({self})")
    }
}

pub fn sample_window(kv_index: u64, data: &Bytes, sample_idx_in_kv: u64) -> Result<Bytes> {
    let out_of_range = || Error::SampleOutOfRange {
        kv_index,
        offset: sample_idx_in_kv.saturating_mul(SAMPLE_SIZE),
        len: data.len(),
    };

    let offset = sample_idx_in_kv.checked_mul(SAMPLE_SIZE).ok_or_else(out_of_range)?;
    let end = offset.checked_add(SAMPLE_SIZE).ok_or_else(out_of_range)?;

    if end > data.len() as u64 {
        return Err(out_of_range());
    }

    Ok(data.slice(offset as usize..end as usize))
}
