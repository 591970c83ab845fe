//! Proof of Stake committee & proposer selection.
//!
//! `SeededSchedule` is a deterministic stand-in shuffle for devnets and tests:
//! - epoch seed = H(randao_mix || epoch)
//! - committee order = active indices sorted by H(seed || 0x00 || index)
//! - proposer order  = active indices sorted by H(seed || 0x01 || index), one per slot
//!
//! It is not the swap-or-not shuffle; any `ScheduleSource` can replace it.

use crate::consensus::schedule::{Committee, EpochSchedule, ScheduleSource};
use crate::consensus::snapshot::BeaconSnapshot;
use crate::consensus::spec::ChainSpec;
use crate::consensus::types::{hash_bytes, Epoch, Hash256, ValidatorIndex, GENESIS_SLOT};
use crate::utils::errors::{DutiesError, Result};

pub const TARGET_COMMITTEE_SIZE: u64 = 128;
pub const MAX_COMMITTEES_PER_SLOT: u64 = 64;

const DOMAIN_COMMITTEE: u8 = 0x00;
const DOMAIN_PROPOSER: u8 = 0x01;

#[derive(Debug, Clone)]
pub struct SeededSchedule {
    target_committee_size: u64,
}

impl Default for SeededSchedule {
    fn default() -> Self {
        Self::new(TARGET_COMMITTEE_SIZE)
    }
}

impl SeededSchedule {
    pub fn new(target_committee_size: u64) -> Self {
        Self { target_committee_size: target_committee_size.max(1) }
    }

    pub fn epoch_seed(randao_mix: &Hash256, epoch: Epoch) -> Hash256 {
        let mut buf = Vec::with_capacity(40);
        buf.extend_from_slice(randao_mix);
        buf.extend_from_slice(&epoch.to_le_bytes());
        hash_bytes(&buf)
    }

    /// Stable permutation of `indices` keyed by `seed` and `domain`.
    fn permute(indices: &[ValidatorIndex], seed: &Hash256, domain: u8) -> Vec<ValidatorIndex> {
        let mut keyed: Vec<(Hash256, ValidatorIndex)> = indices
            .iter()
            .map(|index| {
                let mut buf = Vec::with_capacity(41);
                buf.extend_from_slice(seed);
                buf.push(domain);
                buf.extend_from_slice(&index.to_le_bytes());
                (hash_bytes(&buf), *index)
            })
            .collect();
        keyed.sort_unstable();
        keyed.into_iter().map(|(_, index)| index).collect()
    }

    fn committees_per_slot(&self, active: u64, slots_per_epoch: u64) -> u64 {
        (active / slots_per_epoch / self.target_committee_size).clamp(1, MAX_COMMITTEES_PER_SLOT)
    }
}

impl ScheduleSource for SeededSchedule {
    fn compute(
        &self,
        snapshot: &BeaconSnapshot,
        epoch: Epoch,
        spec: &ChainSpec,
    ) -> Result<EpochSchedule> {
        let active = snapshot.active_indices(epoch);
        if active.is_empty() {
            return Err(DutiesError::Internal(format!(
                "no active validators at epoch {} in snapshot for slot {}",
                epoch,
                snapshot.slot()
            )));
        }

        let seed = Self::epoch_seed(snapshot.randao_mix(), epoch);
        let start_slot = spec.start_slot(epoch)?;
        let mut schedule = EpochSchedule::new(epoch);

        let shuffled = Self::permute(&active, &seed, DOMAIN_COMMITTEE);
        let len = shuffled.len() as u64;
        let per_slot = self.committees_per_slot(len, spec.slots_per_epoch);
        let count = per_slot * spec.slots_per_epoch;
        for k in 0..count {
            // same split points as compute_committee
            let from = (len * k / count) as usize;
            let to = (len * (k + 1) / count) as usize;
            schedule.push_committee(Committee {
                slot: start_slot + k / per_slot,
                index: k % per_slot,
                members: shuffled[from..to].to_vec(),
            });
        }

        let proposer_order = Self::permute(&active, &seed, DOMAIN_PROPOSER);
        for offset in 0..spec.slots_per_epoch {
            let slot = start_slot + offset;
            if slot == GENESIS_SLOT {
                continue;
            }
            let proposer = proposer_order[(offset % len) as usize];
            schedule.push_proposer(proposer, slot);
        }

        Ok(schedule)
    }
}
