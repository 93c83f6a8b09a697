mod blob;
mod cleaner;
mod mem_cache;

pub use blob::{Blob, BlockBlobs};
pub use cleaner::CacheCleaner;
pub use mem_cache::BlobMemCache;
