//! Request and response records of the duty services.

use crate::consensus::types::{Epoch, PublicKey, Slot, ValidatorIndex, GENESIS_EPOCH};
use serde::{Deserialize, Serialize};

/// Which epoch a listing is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryFilter {
    #[default]
    Genesis,
    Epoch(Epoch),
}

impl QueryFilter {
    pub fn epoch(&self) -> Epoch {
        match self {
            QueryFilter::Genesis => GENESIS_EPOCH,
            QueryFilter::Epoch(epoch) => *epoch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListAssignmentsRequest {
    pub query_filter: QueryFilter,
    pub public_keys: Vec<PublicKey>,
    pub indices: Vec<ValidatorIndex>,
    /// Decimal page index; empty means the first page.
    pub page_token: String,
    /// Zero selects the default page size.
    pub page_size: u64,
}

/// Duties of one validator in one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeAssignment {
    pub beacon_committees: Vec<ValidatorIndex>,
    pub committee_index: u64,
    pub attester_slot: Slot,
    pub proposer_slots: Vec<Slot>,
    pub public_key: PublicKey,
    pub validator_index: ValidatorIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorAssignments {
    pub epoch: Epoch,
    pub assignments: Vec<CommitteeAssignment>,
    /// Empty when there are no further pages.
    pub next_page_token: String,
    pub total_size: u64,
}

impl ValidatorAssignments {
    /// The response for a listing with no candidate validators.
    pub fn empty(epoch: Epoch) -> Self {
        Self {
            epoch,
            assignments: Vec::new(),
            next_page_token: "0".to_string(),
            total_size: 0,
        }
    }
}

/// Per-epoch proposer keys and timing for external subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusInfoRecord {
    pub epoch: Epoch,
    /// One `0x`-prefixed key per slot of the epoch, in slot order.
    #[serde(rename = "validatorList")]
    pub validator_list: Vec<String>,
    /// Unix seconds at which the epoch's first slot starts.
    #[serde(rename = "epochTimeStart")]
    pub epoch_time_start: u64,
    /// Seconds per slot.
    #[serde(rename = "slotTimeDuration")]
    pub slot_time_duration: u64,
}
