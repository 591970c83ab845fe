//! Resolves the validator indices a listing covers.

use crate::consensus::snapshot::BeaconSnapshot;
use crate::consensus::types::{Epoch, PublicKey, ValidatorIndex};
use crate::utils::errors::{DutiesError, Result};
use std::collections::HashSet;

pub struct IndexFilter<'a> {
    snapshot: &'a BeaconSnapshot,
    epoch: Epoch,
}

impl<'a> IndexFilter<'a> {
    pub fn new(snapshot: &'a BeaconSnapshot, epoch: Epoch) -> Self {
        Self { snapshot, epoch }
    }

    /// Indices for `public_keys` (in order), then `indices` not already listed.
    ///
    /// Fails on the first key the snapshot does not know. With no filter at all, every
    /// index active at the epoch is returned, ascending.
    pub fn resolve(
        &self,
        public_keys: &[PublicKey],
        indices: &[ValidatorIndex],
    ) -> Result<Vec<ValidatorIndex>> {
        if public_keys.is_empty() && indices.is_empty() {
            return Ok(self.snapshot.active_indices(self.epoch));
        }

        let mut seen = HashSet::with_capacity(public_keys.len() + indices.len());
        let mut filtered = Vec::with_capacity(public_keys.len() + indices.len());

        for public_key in public_keys {
            let index = self.snapshot.index_by_pubkey(public_key).ok_or_else(|| {
                DutiesError::NotFound(format!(
                    "Could not find validator index for public key {}",
                    public_key
                ))
            })?;
            if seen.insert(index) {
                filtered.push(index);
            }
        }

        for index in indices {
            if seen.insert(*index) {
                filtered.push(*index);
            }
        }

        Ok(filtered)
    }
}
