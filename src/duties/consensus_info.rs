//! Minimal consensus info: per-epoch proposer keys for external subscribers, and the
//! epoch-range scan that collects them until history runs out.

use crate::consensus::types::{Epoch, PublicKey, GENESIS_EPOCH};
use crate::duties::proposers::ProposerScheduleService;
use crate::duties::selector::SelectionPolicy;
use crate::duties::types::ConsensusInfoRecord;
use crate::utils::errors::{DutiesError, Result};
use crate::utils::metrics::{CONSENSUS_INFO_RANGE_LENGTH, CONSENSUS_INFO_RECORDS, METRICS};
use futures::{future, stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const DEFAULT_LOOKAHEAD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Epochs computed ahead of the one being appended.
    pub lookahead: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { lookahead: DEFAULT_LOOKAHEAD }
    }
}

pub struct ConsensusInfoScanner {
    proposers: Arc<ProposerScheduleService>,
    config: ScanConfig,
}

impl ConsensusInfoScanner {
    pub fn new(proposers: Arc<ProposerScheduleService>, config: ScanConfig) -> Self {
        Self { proposers, config }
    }

    /// Proposer keys and timing of one past epoch.
    pub async fn minimal_consensus_info(
        &self,
        epoch: Epoch,
        cancel: &CancellationToken,
    ) -> Result<ConsensusInfoRecord> {
        let spec = self.proposers.selector().spec();
        let assignments = self
            .proposers
            .proposer_list_for_epoch(epoch, SelectionPolicy::Historical, cancel)
            .await?;

        let mut by_slot: Vec<(u64, PublicKey)> = assignments
            .assignments
            .iter()
            .flat_map(|a| a.proposer_slots.iter().map(move |slot| (*slot, a.public_key)))
            .collect();
        by_slot.sort_unstable_by_key(|(slot, _)| *slot);

        let mut validator_list = Vec::with_capacity(spec.slots_per_epoch as usize);
        // slot 0 was never signed by anybody
        if epoch == GENESIS_EPOCH {
            validator_list.push(PublicKey::zero().to_hex());
        }
        validator_list.extend(by_slot.iter().map(|(_, key)| key.to_hex()));

        if validator_list.len() as u64 != spec.slots_per_epoch {
            return Err(DutiesError::Internal(format!(
                "not enough assignments, expected: {}, got: {}",
                spec.slots_per_epoch,
                validator_list.len()
            )));
        }

        let epoch_time_start = spec.slot_start_time(spec.start_slot(epoch)?)?;

        Ok(ConsensusInfoRecord {
            epoch,
            validator_list,
            epoch_time_start,
            slot_time_duration: spec.seconds_per_slot,
        })
    }

    /// Records for `after + 1`, `after + 2`, … in order.
    ///
    /// The stream ends at the first epoch that cannot be produced; that failure is the
    /// end-of-history marker and is not yielded. Cancellation is yielded as an error.
    pub fn records_after(
        self: Arc<Self>,
        after: Epoch,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<ConsensusInfoRecord>> + Send + 'static {
        let lookahead = self.config.lookahead.max(1);
        let epochs = after
            .checked_add(1)
            .into_iter()
            .flat_map(|first| first..=Epoch::MAX);

        stream::iter(epochs)
            .map(move |epoch| {
                let scanner = self.clone();
                let cancel = cancel.clone();
                async move {
                    let outcome = scanner.minimal_consensus_info(epoch, &cancel).await;
                    (epoch, outcome)
                }
            })
            .buffered(lookahead)
            .scan(false, move |cancelled, (epoch, outcome)| {
                let item = match outcome {
                    _ if *cancelled => None,
                    Ok(record) => Some(Ok(record)),
                    Err(DutiesError::Cancelled) => {
                        *cancelled = true;
                        Some(Err(DutiesError::Cancelled))
                    }
                    Err(err) => {
                        debug!(
                            current_epoch = epoch,
                            requested_epoch = after,
                            reason = %err,
                            "epoch not found, end of range"
                        );
                        None
                    }
                };
                future::ready(item)
            })
    }

    /// Consecutive records starting at `from_epoch`.
    ///
    /// A failure at `from_epoch` itself is returned. Past it, the scan stops quietly at the
    /// first epoch that fails and returns what it gathered.
    pub async fn get_range(
        self: &Arc<Self>,
        from_epoch: Epoch,
        cancel: &CancellationToken,
    ) -> Result<Vec<ConsensusInfoRecord>> {
        let first = self
            .minimal_consensus_info(from_epoch, cancel)
            .await
            .map_err(|err| {
                error!(
                    requested_epoch = from_epoch,
                    error = %err,
                    "could not produce first epoch of range"
                );
                err
            })?;

        let mut records = vec![first];
        let mut rest = pin!(self.clone().records_after(from_epoch, cancel.clone()));
        while let Some(record) = rest.next().await {
            records.push(record?);
        }

        METRICS.inc_counter_by(CONSENSUS_INFO_RECORDS, records.len() as u64);
        METRICS.set_gauge(CONSENSUS_INFO_RANGE_LENGTH, records.len() as f64);
        info!(
            requested_epoch = from_epoch,
            gathered = records.len(),
            "gathered consensus info range"
        );

        Ok(records)
    }
}
