//! Storage module: retained beacon state snapshots.
//!
//! Engines: in-memory (tests, devnets) and a directory of JSON files.
//! Use `storage::open(engine)` to create an `Arc<dyn SnapshotStore>` to pass to the services.

pub mod fs_store;
pub mod memory;
pub mod traits;

pub use fs_store::FsSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use traits::SnapshotStore;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Engine selection enum
pub enum StorageEngine {
    Memory,
    Fs(PathBuf),
}

/// Open a snapshot store for the chosen engine.
pub fn open(engine: StorageEngine) -> Result<Arc<dyn SnapshotStore>> {
    match engine {
        StorageEngine::Memory => Ok(Arc::new(MemorySnapshotStore::new())),
        StorageEngine::Fs(path) => Ok(Arc::new(FsSnapshotStore::open(path)?)),
    }
}
