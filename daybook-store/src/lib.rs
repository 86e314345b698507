//! daybook-store: CSV-directory storage and the load/score/persist workflows.

pub mod error;
pub mod file_store;
pub mod memory_store;
pub mod parsers;
pub mod repository;
pub mod rows;
pub mod workflows;

pub use error::{StoreError, StoreResult};
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use repository::Repository;
pub use rows::CycleGoalRecord;
