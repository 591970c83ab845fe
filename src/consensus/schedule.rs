//! Raw committee/proposer schedules and the seam that produces them.

use crate::consensus::snapshot::BeaconSnapshot;
use crate::consensus::spec::ChainSpec;
use crate::consensus::types::{Epoch, Slot, ValidatorIndex};
use crate::utils::errors::Result;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committee {
    pub slot: Slot,
    pub index: u64,
    pub members: Vec<ValidatorIndex>,
}

/// Everything the shuffle decided for one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EpochSchedule {
    pub epoch: Epoch,
    pub committees: Vec<Committee>,
    /// validator index -> position in `committees`
    pub committee_positions: HashMap<ValidatorIndex, usize>,
    /// validator index -> its proposer slots, ascending
    pub proposer_slots: BTreeMap<ValidatorIndex, Vec<Slot>>,
}

impl EpochSchedule {
    pub fn new(epoch: Epoch) -> Self {
        Self { epoch, ..Default::default() }
    }

    pub fn push_committee(&mut self, committee: Committee) {
        let position = self.committees.len();
        for member in &committee.members {
            self.committee_positions.insert(*member, position);
        }
        self.committees.push(committee);
    }

    pub fn push_proposer(&mut self, index: ValidatorIndex, slot: Slot) {
        let slots = self.proposer_slots.entry(index).or_default();
        slots.push(slot);
        slots.sort_unstable();
    }

    pub fn committee_of(&self, index: ValidatorIndex) -> Option<&Committee> {
        self.committee_positions
            .get(&index)
            .and_then(|position| self.committees.get(*position))
    }

    pub fn proposer_slots_of(&self, index: ValidatorIndex) -> &[Slot] {
        self.proposer_slots
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn proposer_slot_count(&self) -> usize {
        self.proposer_slots.values().map(Vec::len).sum()
    }

    /// `(slot, proposer)` pairs, ascending by slot.
    pub fn proposers_by_slot(&self) -> Vec<(Slot, ValidatorIndex)> {
        let mut pairs: Vec<(Slot, ValidatorIndex)> = self
            .proposer_slots
            .iter()
            .flat_map(|(index, slots)| slots.iter().map(move |slot| (*slot, *index)))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Computes committee membership and proposer order for an epoch.
///
/// Implementations must be pure in `(snapshot, epoch)`: the schedule cache relies on it.
pub trait ScheduleSource: Send + Sync + 'static {
    fn compute(
        &self,
        snapshot: &BeaconSnapshot,
        epoch: Epoch,
        spec: &ChainSpec,
    ) -> Result<EpochSchedule>;
}
