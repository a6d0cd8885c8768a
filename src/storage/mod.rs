pub mod batch;
pub mod error;
pub mod kv;

pub use batch::{BatchLimits, BatchedStore};
pub use error::{StoreError, StoreResult};
pub use kv::{KvStore, Mutation, Namespace};
