//! Validator duty services.
//!
//! - selector: which retained snapshot applies to an epoch (live / historical)
//! - cache: `ScheduleCache` and the caching `Scheduler`
//! - composer, filter, pagination: building blocks of a listing
//! - assignments: `ValidatorAssignmentService` (filtered, paginated duties)
//! - proposers: `ProposerScheduleService` (full proposer list of an epoch)
//! - consensus_info: `ConsensusInfoScanner` (per-epoch proposer keys, range scans)

pub mod assignments;
pub mod cache;
pub mod composer;
pub mod consensus_info;
pub mod filter;
pub mod pagination;
pub mod proposers;
pub mod selector;
pub mod types;

pub use assignments::ValidatorAssignmentService;
pub use cache::{ScheduleCache, Scheduler};
pub use composer::AssignmentComposer;
pub use consensus_info::{ConsensusInfoScanner, ScanConfig};
pub use filter::IndexFilter;
pub use pagination::{Page, PaginationConfig, PaginationError, Paginator};
pub use proposers::ProposerScheduleService;
pub use selector::{SelectionPolicy, SnapshotSelector};
pub use types::{
    CommitteeAssignment, ConsensusInfoRecord, ListAssignmentsRequest, QueryFilter,
    ValidatorAssignments,
};

use crate::consensus::clock::SlotClock;
use crate::consensus::schedule::ScheduleSource;
use crate::consensus::spec::ChainSpec;
use crate::storage::traits::SnapshotStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub chain: ChainSpec,
    pub pagination: PaginationConfig,
    pub scan: ScanConfig,
}

/// The duty services wired over one store, clock and schedule cache.
pub struct DutyServices {
    pub assignments: ValidatorAssignmentService,
    pub proposers: Arc<ProposerScheduleService>,
    pub consensus_info: Arc<ConsensusInfoScanner>,
    cache: ScheduleCache,
}

impl DutyServices {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn SlotClock>,
        source: Arc<dyn ScheduleSource>,
        cache: ScheduleCache,
        config: ServiceConfig,
    ) -> Self {
        let spec = config.chain;
        let selector = Arc::new(SnapshotSelector::new(store, clock, spec.clone()));
        let scheduler = Arc::new(Scheduler::new(source, cache.clone(), spec.clone()));
        let composer = AssignmentComposer::new(spec);

        let assignments = ValidatorAssignmentService::new(
            selector.clone(),
            scheduler.clone(),
            composer.clone(),
            Paginator::new(config.pagination),
        );
        let proposers = Arc::new(ProposerScheduleService::new(selector, scheduler, composer));
        let consensus_info = Arc::new(ConsensusInfoScanner::new(proposers.clone(), config.scan));

        Self {
            assignments,
            proposers,
            consensus_info,
            cache,
        }
    }

    /// The schedule cache shared by every service. Clear it when the retained snapshot
    /// set is replaced.
    pub fn cache(&self) -> &ScheduleCache {
        &self.cache
    }
}
