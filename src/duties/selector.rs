//! Picks the retained snapshot whose schedule applies to an epoch.

use crate::consensus::clock::SlotClock;
use crate::consensus::snapshot::BeaconSnapshot;
use crate::consensus::spec::ChainSpec;
use crate::consensus::types::Epoch;
use crate::storage::traits::SnapshotStore;
use crate::utils::errors::{DutiesError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// The snapshot taken at the epoch's start slot.
    Live,
    /// Any retained snapshot inside the epoch's slot range, highest slot first.
    Historical,
}

pub struct SnapshotSelector {
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn SlotClock>,
    spec: ChainSpec,
}

impl SnapshotSelector {
    pub fn new(store: Arc<dyn SnapshotStore>, clock: Arc<dyn SlotClock>, spec: ChainSpec) -> Self {
        Self { store, clock, spec }
    }

    pub fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    /// Epoch of the clock's current slot; the genesis epoch before genesis.
    pub fn current_epoch(&self) -> Epoch {
        self.spec.epoch_of(self.clock.now_or_genesis())
    }

    pub async fn select(
        &self,
        epoch: Epoch,
        policy: SelectionPolicy,
        cancel: &CancellationToken,
    ) -> Result<Arc<BeaconSnapshot>> {
        if cancel.is_cancelled() {
            return Err(DutiesError::Cancelled);
        }
        let current_epoch = self.current_epoch();
        if epoch > current_epoch {
            return Err(DutiesError::NotFound(format!(
                "no snapshot for epoch {}: epoch is in the future, current epoch {}",
                epoch, current_epoch
            )));
        }

        match policy {
            SelectionPolicy::Live => self.live(epoch, cancel).await,
            SelectionPolicy::Historical => self.historical(epoch, cancel).await,
        }
    }

    async fn live(&self, epoch: Epoch, cancel: &CancellationToken) -> Result<Arc<BeaconSnapshot>> {
        let start_slot = self.spec.start_slot(epoch)?;
        let state = fetch(epoch, cancel, self.store.state_by_slot(start_slot)).await?;
        state.ok_or_else(|| {
            DutiesError::NotFound(format!(
                "Could not retrieve archived state for epoch {}: no snapshot at slot {}",
                epoch, start_slot
            ))
        })
    }

    async fn historical(
        &self,
        epoch: Epoch,
        cancel: &CancellationToken,
    ) -> Result<Arc<BeaconSnapshot>> {
        let start_slot = self.spec.start_slot(epoch)?;
        let end_slot = self.spec.end_slot(epoch)?;
        // Every snapshot inside the epoch shares its seed, so the latest one will do.
        let request = self.store.latest_state_in(start_slot, end_slot);
        let state = fetch(epoch, cancel, request).await?.ok_or_else(|| {
            DutiesError::NotFound(format!("Could not retrieve any state for epoch {}", epoch))
        })?;
        debug!(epoch, snapshot_slot = state.slot(), "selected historical snapshot");
        Ok(state)
    }
}

/// Run a storage request unless `cancel` fires first.
async fn fetch<T, F>(epoch: Epoch, cancel: &CancellationToken, request: F) -> Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DutiesError::Cancelled),
        res = request => res.map_err(|e| {
            DutiesError::Internal(format!(
                "Could not retrieve archived state for epoch {}: {:#}",
                epoch, e
            ))
        }),
    }
}
