use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("kv not found: index={kv_index}")]
    NotFound { kv_index: u64 },

    #[error("already tracking {0}")]
    AlreadyTracking(String),

    #[error("not tracking {0}")]
    NotTracking(String),

    #[error("sample out of range: index={kv_index} offset={offset} len={len}")]
    SampleOutOfRange { kv_index: u64, offset: u64, len: usize },

    #[error("blob too large: index={kv_index} len={len} max={max}")]
    BlobTooLarge { kv_index: u64, len: usize, max: usize },

    #[error("blob cache closed")]
    Closed,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
