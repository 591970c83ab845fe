//! Validator duty and proposer schedule service.
//!
//! Answers, for an epoch, which committee each validator attests in and at which slots it
//! proposes, from beacon state snapshots retained in a `SnapshotStore`.

pub mod consensus;
pub mod duties;
pub mod node;
pub mod rpc;
pub mod storage;
pub mod test_utils;
pub mod utils;

#[cfg(test)]
mod tests;
