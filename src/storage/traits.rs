use crate::consensus::snapshot::BeaconSnapshot;
use crate::consensus::types::Slot;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Retained beacon state snapshots, keyed by slot.
///
/// Snapshots are immutable once stored; engines hand out shared `Arc`s.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    fn name(&self) -> String;

    /// Store a snapshot, replacing any snapshot already held for its slot.
    async fn put(&self, snapshot: BeaconSnapshot) -> Result<()>;

    /// The snapshot taken at exactly `slot`.
    async fn state_by_slot(&self, slot: Slot) -> Result<Option<Arc<BeaconSnapshot>>>;

    /// The highest-slot snapshot with `start <= snapshot.slot() <= end`. Only that one
    /// snapshot is read.
    async fn latest_state_in(&self, start: Slot, end: Slot) -> Result<Option<Arc<BeaconSnapshot>>>;

    /// Drop the snapshot for `slot`, if any.
    async fn delete(&self, slot: Slot) -> Result<()>;

    /// Slots of all retained snapshots, ascending.
    async fn slots(&self) -> Result<Vec<Slot>>;

    /// Path where the engine stores data (useful for debugging)
    fn path(&self) -> Option<PathBuf> {
        None
    }
}
