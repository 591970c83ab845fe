//! Consensus primitives the duty services are built on.
//!
//! Public surface:
//! - types: slots, epochs, validator indices, public keys
//! - spec: `ChainSpec` slot/epoch arithmetic
//! - clock: `SlotClock` and its system/manual implementations
//! - snapshot: immutable `BeaconSnapshot` views
//! - schedule: `EpochSchedule` and the `ScheduleSource` seam
//! - pos: `SeededSchedule`, the built-in schedule source

pub mod clock;
pub mod pos;
pub mod schedule;
pub mod snapshot;
pub mod spec;
pub mod types;

pub use clock::{ManualSlotClock, SlotClock, SystemTimeSlotClock};
pub use pos::SeededSchedule;
pub use schedule::{Committee, EpochSchedule, ScheduleSource};
pub use snapshot::{BeaconSnapshot, SnapshotFile, Validator};
pub use spec::ChainSpec;
pub use types::{Epoch, Hash256, PublicKey, Slot, ValidatorIndex};
