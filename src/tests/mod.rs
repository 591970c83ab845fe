//! Test module for the duty services.
//!
//! - Integration tests (listings, proposer lists, consensus info ranges, RPC end-to-end)
//! - Fuzz tests (randomized validator sets, filters and page walks)

mod integration;
