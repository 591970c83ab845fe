//! Full proposer lists for single epochs.

use crate::consensus::types::Epoch;
use crate::duties::cache::Scheduler;
use crate::duties::composer::AssignmentComposer;
use crate::duties::selector::{SelectionPolicy, SnapshotSelector};
use crate::duties::types::ValidatorAssignments;
use crate::utils::errors::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ProposerScheduleService {
    selector: Arc<SnapshotSelector>,
    scheduler: Arc<Scheduler>,
    composer: AssignmentComposer,
}

impl ProposerScheduleService {
    pub fn new(
        selector: Arc<SnapshotSelector>,
        scheduler: Arc<Scheduler>,
        composer: AssignmentComposer,
    ) -> Self {
        Self {
            selector,
            scheduler,
            composer,
        }
    }

    pub fn selector(&self) -> &SnapshotSelector {
        &self.selector
    }

    /// Every proposer of `epoch`, unfiltered and unpaginated.
    pub async fn proposer_list_for_epoch(
        &self,
        epoch: Epoch,
        policy: SelectionPolicy,
        cancel: &CancellationToken,
    ) -> Result<ValidatorAssignments> {
        let snapshot = self.selector.select(epoch, policy, cancel).await?;
        let schedule = self.scheduler.schedule_for(&snapshot, epoch)?;
        let assignments = self.composer.proposers(&snapshot, epoch, &schedule)?;
        debug!(
            epoch,
            snapshot_slot = snapshot.slot(),
            proposers = assignments.len(),
            "computed proposer list"
        );

        Ok(ValidatorAssignments {
            epoch,
            total_size: assignments.len() as u64,
            assignments,
            next_page_token: String::new(),
        })
    }

    /// Proposers of the epoch the clock is currently in.
    pub async fn next_epoch_proposer_list(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ValidatorAssignments> {
        let epoch = self.selector.current_epoch();
        self.proposer_list_for_epoch(epoch, SelectionPolicy::Live, cancel)
            .await
    }
}
