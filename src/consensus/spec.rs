//! Slot/epoch arithmetic for a chain configuration.

use crate::consensus::types::{Epoch, Slot, GENESIS_EPOCH};
use crate::utils::errors::{DutiesError, Result};
use serde::{Deserialize, Serialize};

/// Chain constants the duty services depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSpec {
    pub slots_per_epoch: u64,
    pub seconds_per_slot: u64,
    /// Unix timestamp (seconds) of slot 0.
    pub genesis_time: u64,
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ChainSpec {
    pub fn mainnet() -> Self {
        Self {
            slots_per_epoch: 32,
            seconds_per_slot: 12,
            genesis_time: 1_606_824_023,
        }
    }

    /// Small epochs for tests and local devnets.
    pub fn minimal() -> Self {
        Self {
            slots_per_epoch: 8,
            seconds_per_slot: 6,
            genesis_time: 1_606_824_023,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.slots_per_epoch == 0 {
            return Err("slots_per_epoch must be greater than zero".into());
        }
        if self.seconds_per_slot == 0 {
            return Err("seconds_per_slot must be greater than zero".into());
        }
        Ok(())
    }

    pub fn epoch_of(&self, slot: Slot) -> Epoch {
        slot.checked_div(self.slots_per_epoch).unwrap_or(GENESIS_EPOCH)
    }

    pub fn start_slot(&self, epoch: Epoch) -> Result<Slot> {
        epoch.checked_mul(self.slots_per_epoch).ok_or_else(|| {
            DutiesError::Internal(format!("start slot of epoch {} overflows", epoch))
        })
    }

    /// Last slot of `epoch`, inclusive.
    pub fn end_slot(&self, epoch: Epoch) -> Result<Slot> {
        self.start_slot(epoch)?
            .checked_add(self.slots_per_epoch.saturating_sub(1))
            .ok_or_else(|| DutiesError::Internal(format!("end slot of epoch {} overflows", epoch)))
    }

    /// Proposer slots an epoch carries. The genesis slot never has a proposer.
    pub fn expected_proposer_slots(&self, epoch: Epoch) -> u64 {
        if epoch == GENESIS_EPOCH {
            self.slots_per_epoch.saturating_sub(1)
        } else {
            self.slots_per_epoch
        }
    }

    /// Unix timestamp at which `slot` begins.
    pub fn slot_start_time(&self, slot: Slot) -> Result<u64> {
        slot.checked_mul(self.seconds_per_slot)
            .and_then(|offset| offset.checked_add(self.genesis_time))
            .ok_or_else(|| DutiesError::Internal(format!("start time of slot {} overflows", slot)))
    }
}
