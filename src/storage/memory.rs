use crate::consensus::snapshot::BeaconSnapshot;
use crate::consensus::types::Slot;
use crate::storage::traits::SnapshotStore;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// In-process snapshot store for tests and local devnets.
#[derive(Default)]
pub struct MemorySnapshotStore {
    states: RwLock<BTreeMap<Slot, Arc<BeaconSnapshot>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    fn name(&self) -> String {
        "memory".into()
    }

    async fn put(&self, snapshot: BeaconSnapshot) -> Result<()> {
        self.states.write().insert(snapshot.slot(), Arc::new(snapshot));
        Ok(())
    }

    async fn state_by_slot(&self, slot: Slot) -> Result<Option<Arc<BeaconSnapshot>>> {
        Ok(self.states.read().get(&slot).cloned())
    }

    async fn latest_state_in(&self, start: Slot, end: Slot) -> Result<Option<Arc<BeaconSnapshot>>> {
        if start > end {
            return Ok(None);
        }
        Ok(self
            .states
            .read()
            .range(start..=end)
            .next_back()
            .map(|(_, state)| state.clone()))
    }

    async fn delete(&self, slot: Slot) -> Result<()> {
        self.states.write().remove(&slot);
        Ok(())
    }

    async fn slots(&self) -> Result<Vec<Slot>> {
        Ok(self.states.read().keys().copied().collect())
    }
}
