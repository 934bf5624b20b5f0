//! Generic entity store

mod entity_store;

pub use entity_store::{Store, StoreBacking, StoreError, StoreResult};
