//! Filtered, paginated validator duty listings.

use crate::duties::cache::Scheduler;
use crate::duties::composer::AssignmentComposer;
use crate::duties::filter::IndexFilter;
use crate::duties::pagination::Paginator;
use crate::duties::selector::{SelectionPolicy, SnapshotSelector};
use crate::duties::types::{ListAssignmentsRequest, ValidatorAssignments};
use crate::utils::errors::{DutiesError, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ValidatorAssignmentService {
    selector: Arc<SnapshotSelector>,
    scheduler: Arc<Scheduler>,
    composer: AssignmentComposer,
    paginator: Paginator,
}

impl ValidatorAssignmentService {
    pub fn new(
        selector: Arc<SnapshotSelector>,
        scheduler: Arc<Scheduler>,
        composer: AssignmentComposer,
        paginator: Paginator,
    ) -> Self {
        Self {
            selector,
            scheduler,
            composer,
            paginator,
        }
    }

    /// Duties for the requested epoch, optionally narrowed to some validators.
    pub async fn list_validator_assignments(
        &self,
        request: &ListAssignmentsRequest,
        cancel: &CancellationToken,
    ) -> Result<ValidatorAssignments> {
        self.paginator.page_size(request.page_size)?;

        let requested_epoch = request.query_filter.epoch();
        let current_epoch = self.selector.current_epoch();
        if requested_epoch > current_epoch {
            return Err(DutiesError::InvalidArgument(format!(
                "Cannot retrieve information about an epoch in the future, \
                 current epoch {}, requesting {}",
                current_epoch, requested_epoch
            )));
        }

        let snapshot = self
            .selector
            .select(requested_epoch, SelectionPolicy::Live, cancel)
            .await?;

        let candidates = IndexFilter::new(&snapshot, requested_epoch)
            .resolve(&request.public_keys, &request.indices)?;
        if candidates.is_empty() {
            debug!(epoch = requested_epoch, "no validators to list");
            return Ok(ValidatorAssignments::empty(requested_epoch));
        }

        let page = self
            .paginator
            .paginate(&request.page_token, request.page_size, candidates.len())?;

        let schedule = self.scheduler.schedule_for(&snapshot, requested_epoch)?;
        let assignments = self.composer.compose(
            &snapshot,
            requested_epoch,
            &schedule,
            &candidates[page.start..page.end],
        )?;

        debug!(
            epoch = requested_epoch,
            start = page.start,
            end = page.end,
            total = candidates.len(),
            "listed validator assignments"
        );

        Ok(ValidatorAssignments {
            epoch: requested_epoch,
            assignments,
            next_page_token: page.next_page_token,
            total_size: candidates.len() as u64,
        })
    }
}
