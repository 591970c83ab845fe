//! Immutable beacon state snapshots as the duty services see them.

use crate::consensus::types::{hash_bytes, Epoch, Hash256, PublicKey, Slot, ValidatorIndex};
use crate::utils::serde_helpers::{as_hex, from_hex_array};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub public_key: PublicKey,
    pub activation_epoch: Epoch,
    pub exit_epoch: Epoch,
}

impl Validator {
    /// `activation_epoch <= epoch < exit_epoch`
    pub fn is_active_at(&self, epoch: Epoch) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }
}

/// A read-only view of every validator at one slot.
///
/// Built once and shared behind an `Arc`; nothing in this crate mutates it.
#[derive(Debug)]
pub struct BeaconSnapshot {
    slot: Slot,
    randao_mix: Hash256,
    validators: Vec<Validator>,
    pubkey_cache: HashMap<PublicKey, ValidatorIndex>,
    root: Hash256,
}

impl BeaconSnapshot {
    pub fn new(slot: Slot, randao_mix: Hash256, validators: Vec<Validator>) -> Self {
        let mut pubkey_cache = HashMap::with_capacity(validators.len());
        for (index, validator) in validators.iter().enumerate() {
            // first registration wins for duplicated keys
            pubkey_cache
                .entry(validator.public_key)
                .or_insert(index as ValidatorIndex);
        }
        let root = Self::compute_root(slot, &randao_mix, &validators);

        Self {
            slot,
            randao_mix,
            validators,
            pubkey_cache,
            root,
        }
    }

    fn compute_root(slot: Slot, randao_mix: &Hash256, validators: &[Validator]) -> Hash256 {
        let mut buf = Vec::with_capacity(40 + validators.len() * 64);
        buf.extend_from_slice(&slot.to_le_bytes());
        buf.extend_from_slice(randao_mix);
        for v in validators {
            buf.extend_from_slice(v.public_key.as_bytes());
            buf.extend_from_slice(&v.activation_epoch.to_le_bytes());
            buf.extend_from_slice(&v.exit_epoch.to_le_bytes());
        }
        hash_bytes(&buf)
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Identity of this snapshot's contents.
    pub fn root(&self) -> Hash256 {
        self.root
    }

    pub fn randao_mix(&self) -> &Hash256 {
        &self.randao_mix
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn validator_count(&self) -> u64 {
        self.validators.len() as u64
    }

    pub fn pubkey_at(&self, index: ValidatorIndex) -> Option<PublicKey> {
        let index = usize::try_from(index).ok()?;
        self.validators.get(index).map(|v| v.public_key)
    }

    pub fn index_by_pubkey(&self, public_key: &PublicKey) -> Option<ValidatorIndex> {
        self.pubkey_cache.get(public_key).copied()
    }

    /// Indices active at `epoch`, ascending. Evaluated against `epoch`, not `self.slot`.
    pub fn active_indices(&self, epoch: Epoch) -> Vec<ValidatorIndex> {
        self.validators
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active_at(epoch))
            .map(|(i, _)| i as ValidatorIndex)
            .collect()
    }

    pub fn to_file(&self) -> SnapshotFile {
        SnapshotFile {
            slot: self.slot,
            randao_mix: self.randao_mix,
            validators: self.validators.clone(),
        }
    }
}

/// On-disk JSON form of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub slot: Slot,
    #[serde(serialize_with = "as_hex", deserialize_with = "from_hex_array")]
    pub randao_mix: Hash256,
    pub validators: Vec<Validator>,
}

impl From<SnapshotFile> for BeaconSnapshot {
    fn from(file: SnapshotFile) -> Self {
        BeaconSnapshot::new(file.slot, file.randao_mix, file.validators)
    }
}
