//! Slot clocks: the wall-clock source the services read the current slot from.

use crate::consensus::types::{Slot, GENESIS_SLOT};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A clock that reports the current slot.
///
/// The clock is not required to be monotonically increasing and may go backwards.
pub trait SlotClock: Send + Sync {
    /// Returns the slot at this present time, or `None` before genesis or if the system
    /// clock cannot be read.
    fn now(&self) -> Option<Slot>;

    fn genesis_slot(&self) -> Slot {
        GENESIS_SLOT
    }

    /// Current slot, falling back to the genesis slot.
    fn now_or_genesis(&self) -> Slot {
        self.now().unwrap_or_else(|| self.genesis_slot())
    }
}

/// Reads the system time.
#[derive(Debug, Clone)]
pub struct SystemTimeSlotClock {
    genesis_duration: Duration,
    slot_duration: Duration,
}

impl SystemTimeSlotClock {
    pub fn new(genesis_time: u64, seconds_per_slot: u64) -> Self {
        Self {
            genesis_duration: Duration::from_secs(genesis_time),
            slot_duration: Duration::from_secs(seconds_per_slot),
        }
    }

    /// Slot at `now`, a duration since the UNIX epoch.
    pub fn slot_of(&self, now: Duration) -> Option<Slot> {
        let since_genesis = now.checked_sub(self.genesis_duration)?;
        let slot = since_genesis
            .as_millis()
            .checked_div(self.slot_duration.as_millis())?;
        Slot::try_from(slot).ok()
    }
}

impl SlotClock for SystemTimeSlotClock {
    fn now(&self) -> Option<Slot> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
        self.slot_of(now)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualSlotClock {
    slot: Arc<RwLock<Slot>>,
}

impl ManualSlotClock {
    pub fn new(slot: Slot) -> Self {
        Self { slot: Arc::new(RwLock::new(slot)) }
    }

    pub fn set_slot(&self, slot: Slot) {
        *self.slot.write() = slot;
    }

    pub fn advance_slot(&self) {
        *self.slot.write() += 1;
    }
}

impl SlotClock for ManualSlotClock {
    fn now(&self) -> Option<Slot> {
        Some(*self.slot.read())
    }
}
