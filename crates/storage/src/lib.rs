#![forbid(unsafe_code)]

mod buffer;
pub mod keys;
pub mod records;
pub mod repository;
pub mod sqlite;

pub use keys::ProgressKey;
pub use repository::{InMemoryProgressStore, ProgressStore, ScalarValue, Storage, StorageError};
