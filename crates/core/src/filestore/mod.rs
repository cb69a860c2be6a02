//! Expiring file store for offloaded deliveries.

mod store;
mod types;

pub use store::ExpiringFileStore;
pub use types::{FileStoreError, RetrievedFile, StoredFile};
