//! Turns a raw epoch schedule into response records.

use crate::consensus::schedule::EpochSchedule;
use crate::consensus::snapshot::BeaconSnapshot;
use crate::consensus::spec::ChainSpec;
use crate::consensus::types::{Epoch, ValidatorIndex};
use crate::duties::types::CommitteeAssignment;
use crate::utils::errors::{DutiesError, Result};

#[derive(Debug, Clone)]
pub struct AssignmentComposer {
    spec: ChainSpec,
}

impl AssignmentComposer {
    pub fn new(spec: ChainSpec) -> Self {
        Self { spec }
    }

    /// The full schedule must carry exactly the epoch's proposer slots. Never padded or
    /// truncated.
    pub fn validate_proposer_count(&self, epoch: Epoch, schedule: &EpochSchedule) -> Result<()> {
        if schedule.epoch != epoch {
            return Err(DutiesError::Internal(format!(
                "schedule is for epoch {}, expected epoch {}",
                schedule.epoch, epoch
            )));
        }
        let expected = self.spec.expected_proposer_slots(epoch);
        let got = schedule.proposer_slot_count() as u64;
        if got != expected {
            return Err(DutiesError::Internal(format!(
                "invalid proposer slot count, expected: {}, got: {}, epoch: {}",
                expected, got, epoch
            )));
        }
        Ok(())
    }

    /// One assignment per entry of `indices`, in the same order.
    pub fn compose(
        &self,
        snapshot: &BeaconSnapshot,
        epoch: Epoch,
        schedule: &EpochSchedule,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<CommitteeAssignment>> {
        self.validate_proposer_count(epoch, schedule)?;

        let validator_count = snapshot.validator_count();
        indices
            .iter()
            .map(|&index| {
                let public_key = snapshot.pubkey_at(index).ok_or_else(|| {
                    DutiesError::OutOfRange(format!(
                        "Validator index {} >= validator count {}",
                        index, validator_count
                    ))
                })?;
                let committee = schedule.committee_of(index);

                Ok(CommitteeAssignment {
                    beacon_committees: committee.map(|c| c.members.clone()).unwrap_or_default(),
                    committee_index: committee.map_or(0, |c| c.index),
                    attester_slot: committee.map_or(0, |c| c.slot),
                    proposer_slots: schedule.proposer_slots_of(index).to_vec(),
                    public_key,
                    validator_index: index,
                })
            })
            .collect()
    }

    /// One proposer-only record per validator holding a proposer slot, ordered by its
    /// first slot.
    pub fn proposers(
        &self,
        snapshot: &BeaconSnapshot,
        epoch: Epoch,
        schedule: &EpochSchedule,
    ) -> Result<Vec<CommitteeAssignment>> {
        self.validate_proposer_count(epoch, schedule)?;

        let mut proposers: Vec<(&ValidatorIndex, &Vec<u64>)> = schedule
            .proposer_slots
            .iter()
            .filter(|(_, slots)| !slots.is_empty())
            .collect();
        proposers.sort_by_key(|(index, slots)| (slots[0], **index));

        proposers
            .into_iter()
            .map(|(&index, slots)| {
                let public_key = snapshot.pubkey_at(index).ok_or_else(|| {
                    DutiesError::Internal(format!(
                        "proposer index {} >= validator count {}",
                        index,
                        snapshot.validator_count()
                    ))
                })?;
                Ok(CommitteeAssignment {
                    beacon_committees: Vec::new(),
                    committee_index: 0,
                    attester_slot: 0,
                    proposer_slots: slots.clone(),
                    public_key,
                    validator_index: index,
                })
            })
            .collect()
    }
}
