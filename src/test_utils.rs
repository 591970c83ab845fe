//! Helpers for building a chain of retained snapshots in tests and devnets.

use crate::consensus::clock::ManualSlotClock;
use crate::consensus::pos::SeededSchedule;
use crate::consensus::snapshot::{BeaconSnapshot, Validator};
use crate::consensus::spec::ChainSpec;
use crate::consensus::types::{Epoch, Hash256, PublicKey, Slot, FAR_FUTURE_EPOCH, PUBKEY_BYTES_LEN};
use crate::duties::{DutyServices, ScheduleCache, ServiceConfig};
use crate::storage::memory::MemorySnapshotStore;
use crate::storage::traits::SnapshotStore;
use std::ops::Range;
use std::sync::Arc;

pub const HARNESS_RANDAO_MIX: Hash256 = [0x5a; 32];

/// Public key whose first eight bytes are `index` little-endian.
pub fn validator_key(index: u64) -> PublicKey {
    let mut raw = [0u8; PUBKEY_BYTES_LEN];
    raw[..8].copy_from_slice(&index.to_le_bytes());
    PublicKey(raw)
}

/// `count` validators, all active from genesis.
pub fn active_validators(count: u64) -> Vec<Validator> {
    (0..count)
        .map(|i| Validator {
            public_key: validator_key(i),
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
        })
        .collect()
}

/// An in-memory store, a manual clock and the services over them.
pub struct ChainHarness {
    pub spec: ChainSpec,
    pub store: Arc<MemorySnapshotStore>,
    pub clock: ManualSlotClock,
    pub services: Arc<DutyServices>,
}

impl ChainHarness {
    pub fn new(spec: ChainSpec) -> Self {
        Self::with_config(ServiceConfig { chain: spec, ..Default::default() })
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let spec = config.chain.clone();
        let store = Arc::new(MemorySnapshotStore::new());
        let clock = ManualSlotClock::new(0);
        let services = Arc::new(DutyServices::new(
            store.clone(),
            Arc::new(clock.clone()),
            Arc::new(SeededSchedule::default()),
            ScheduleCache::new(),
            config,
        ));

        Self {
            spec,
            store,
            clock,
            services,
        }
    }

    pub fn snapshot(&self, slot: Slot, validators: &[Validator]) -> BeaconSnapshot {
        BeaconSnapshot::new(slot, HARNESS_RANDAO_MIX, validators.to_vec())
    }

    /// Store one snapshot per epoch at the epoch's start slot.
    pub async fn add_epoch_snapshots(&self, epochs: Range<Epoch>, validators: &[Validator]) {
        for epoch in epochs {
            let slot = epoch * self.spec.slots_per_epoch;
            self.add_snapshot(slot, validators).await;
        }
    }

    pub async fn add_snapshot(&self, slot: Slot, validators: &[Validator]) {
        self.store
            .put(self.snapshot(slot, validators))
            .await
            .expect("memory store never fails");
    }

    /// Move the clock to the first slot of `epoch`.
    pub fn set_current_epoch(&self, epoch: Epoch) {
        self.clock.set_slot(epoch * self.spec.slots_per_epoch);
    }
}
