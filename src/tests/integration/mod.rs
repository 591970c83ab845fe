//! Integration tests: retained snapshots in a memory store, services on top, check responses.

use crate::consensus::snapshot::{BeaconSnapshot, Validator};
use crate::consensus::spec::ChainSpec;
use crate::consensus::types::{PublicKey, Slot, FAR_FUTURE_EPOCH};
use crate::duties::selector::SelectionPolicy;
use crate::duties::types::{ListAssignmentsRequest, QueryFilter};
use crate::duties::{ScanConfig, ServiceConfig};
use crate::rpc::{BeaconDutiesApiClient, RpcServer};
use crate::storage::memory::MemorySnapshotStore;
use crate::storage::traits::SnapshotStore;
use crate::test_utils::{active_validators, validator_key, ChainHarness};
use crate::utils::errors::DutiesError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Minimal chain (8 slots per epoch) with snapshots for epochs `0..epochs`, clock in the
/// last of them.
async fn harness(validators: &[Validator], epochs: u64) -> ChainHarness {
    let harness = ChainHarness::new(ChainSpec::minimal());
    harness.add_epoch_snapshots(0..epochs, validators).await;
    harness.set_current_epoch(epochs - 1);
    harness
}

fn request(epoch: u64) -> ListAssignmentsRequest {
    ListAssignmentsRequest {
        query_filter: QueryFilter::Epoch(epoch),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_proposer_list_slot_counts() {
    let h = harness(&active_validators(100), 4).await;
    let cancel = CancellationToken::new();

    for (epoch, expected) in [(0u64, 7usize), (1, 8), (3, 8)] {
        let list = h
            .services
            .proposers
            .proposer_list_for_epoch(epoch, SelectionPolicy::Live, &cancel)
            .await
            .unwrap();
        let slots: usize = list.assignments.iter().map(|a| a.proposer_slots.len()).sum();
        assert_eq!(slots, expected, "epoch {}", epoch);
        assert_eq!(list.total_size, list.assignments.len() as u64);
        assert!(list.next_page_token.is_empty());

        let start = epoch * 8;
        for assignment in &list.assignments {
            assert!(assignment.beacon_committees.is_empty());
            assert!(assignment.proposer_slots.iter().all(|s| *s >= start && *s < start + 8));
        }
    }
}

#[tokio::test]
async fn test_next_epoch_proposer_list_uses_clock() {
    let h = harness(&active_validators(64), 3).await;
    let cancel = CancellationToken::new();
    let list = h.services.proposers.next_epoch_proposer_list(&cancel).await.unwrap();
    assert_eq!(list.epoch, 2);

    h.set_current_epoch(3);
    let err = h.services.proposers.next_epoch_proposer_list(&cancel).await.unwrap_err();
    assert!(matches!(err, DutiesError::NotFound(_)), "{}", err);
}

#[tokio::test]
async fn test_future_epoch_is_invalid_argument() {
    let h = harness(&active_validators(16), 2).await;
    let err = h
        .services
        .assignments
        .list_validator_assignments(&request(5), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        DutiesError::InvalidArgument(msg) => {
            assert!(msg.contains("Cannot retrieve information about an epoch in the future"));
            assert!(msg.contains("current epoch 1, requesting 5"), "{}", msg);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_no_candidates_returns_empty_listing() {
    let exited: Vec<Validator> = active_validators(10)
        .into_iter()
        .map(|v| Validator { exit_epoch: 0, ..v })
        .collect();
    let h = harness(&exited, 1).await;

    let res = h
        .services
        .assignments
        .list_validator_assignments(&request(0), &CancellationToken::new())
        .await
        .unwrap();
    assert!(res.assignments.is_empty());
    assert_eq!(res.next_page_token, "0");
    assert_eq!(res.total_size, 0);
}

#[tokio::test]
async fn test_page_start_beyond_list() {
    let h = harness(&active_validators(100), 1).await;
    let req = ListAssignmentsRequest { page_token: "2".into(), ..request(0) };
    let err = h
        .services
        .assignments
        .list_validator_assignments(&req, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        DutiesError::Internal(msg) => {
            assert!(msg.contains("page start 500 >= list 100"), "{}", msg)
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_page_size_above_max() {
    let h = harness(&active_validators(10), 1).await;
    let req = ListAssignmentsRequest { page_size: 501, ..request(0) };
    let err = h
        .services
        .assignments
        .list_validator_assignments(&req, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        DutiesError::InvalidArgument(msg) => {
            assert!(msg.contains("Requested page size 501 can not be greater than max size 500"))
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_default_page_skips_inactive_validators() {
    let validators: Vec<Validator> = active_validators(300)
        .into_iter()
        .enumerate()
        .map(|(i, v)| if i % 3 == 0 { Validator { exit_epoch: 0, ..v } } else { v })
        .collect();
    let h = harness(&validators, 1).await;

    let res = h
        .services
        .assignments
        .list_validator_assignments(&request(0), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(res.total_size, 200);
    assert_eq!(res.assignments.len(), 200);
    assert!(res.next_page_token.is_empty());

    let indices: Vec<u64> = res.assignments.iter().map(|a| a.validator_index).collect();
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
    for assignment in &res.assignments {
        assert_ne!(assignment.validator_index % 3, 0);
        assert_eq!(assignment.public_key, validator_key(assignment.validator_index));
        assert!(assignment.beacon_committees.contains(&assignment.validator_index));
        assert!(assignment.attester_slot < 8);
    }
}

#[tokio::test]
async fn test_explicit_inactive_validator_gets_empty_committee() {
    let mut validators = active_validators(20);
    validators[4].exit_epoch = 0;
    let h = harness(&validators, 1).await;

    let req = ListAssignmentsRequest { indices: vec![4, 5], ..request(0) };
    let res = h
        .services
        .assignments
        .list_validator_assignments(&req, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(res.assignments[0].validator_index, 4);
    assert!(res.assignments[0].beacon_committees.is_empty());
    assert_eq!(res.assignments[0].attester_slot, 0);
    assert_eq!(res.assignments[0].committee_index, 0);
    assert!(res.assignments[0].proposer_slots.is_empty());
    assert!(!res.assignments[1].beacon_committees.is_empty());
}

#[tokio::test]
async fn test_public_keys_and_indices_are_merged() {
    let h = harness(&active_validators(50), 1).await;
    let req = ListAssignmentsRequest {
        public_keys: vec![validator_key(1), validator_key(2)],
        indices: vec![2, 3],
        ..request(0)
    };
    let res = h
        .services
        .assignments
        .list_validator_assignments(&req, &CancellationToken::new())
        .await
        .unwrap();
    let indices: Vec<u64> = res.assignments.iter().map(|a| a.validator_index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(res.total_size, 3);
}

#[tokio::test]
async fn test_unknown_public_key_is_not_found() {
    let h = harness(&active_validators(50), 1).await;
    let req = ListAssignmentsRequest { public_keys: vec![validator_key(999)], ..request(0) };
    let err = h
        .services
        .assignments
        .list_validator_assignments(&req, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        DutiesError::NotFound(msg) => {
            assert!(msg.contains("Could not find validator index for public key"));
            assert!(msg.contains(&validator_key(999).to_hex()));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_index_beyond_registry_is_out_of_range() {
    let h = harness(&active_validators(100), 1).await;
    let req = ListAssignmentsRequest { indices: vec![1000], ..request(0) };
    let err = h
        .services
        .assignments
        .list_validator_assignments(&req, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DutiesError::OutOfRange("Validator index 1000 >= validator count 100".into())
    );
}

#[tokio::test]
async fn test_page_token_rescaled_by_page_size() {
    let h = harness(&active_validators(100), 1).await;
    let cancel = CancellationToken::new();
    let filter = ListAssignmentsRequest { indices: (0..6).collect(), ..request(0) };

    let small = ListAssignmentsRequest { page_token: "1".into(), page_size: 2, ..filter.clone() };
    let res = h.services.assignments.list_validator_assignments(&small, &cancel).await.unwrap();
    let indices: Vec<u64> = res.assignments.iter().map(|a| a.validator_index).collect();
    assert_eq!(indices, vec![2, 3]);
    assert_eq!(res.next_page_token, "2");
    assert_eq!(res.total_size, 6);

    let large = ListAssignmentsRequest { page_token: "1".into(), page_size: 5, ..filter };
    let res = h.services.assignments.list_validator_assignments(&large, &cancel).await.unwrap();
    let indices: Vec<u64> = res.assignments.iter().map(|a| a.validator_index).collect();
    assert_eq!(indices, vec![5]);
    assert_eq!(res.next_page_token, "");
}

#[tokio::test]
async fn test_listing_is_deterministic_across_cache_clears() {
    let h = harness(&active_validators(120), 3).await;
    let cancel = CancellationToken::new();

    let assignments = &h.services.assignments;

    let first = assignments.list_validator_assignments(&request(2), &cancel).await.unwrap();
    assert!(!h.services.cache().is_empty());
    let cached = assignments.list_validator_assignments(&request(2), &cancel).await.unwrap();
    h.services.cache().clear();
    let recomputed = assignments.list_validator_assignments(&request(2), &cancel).await.unwrap();

    assert_eq!(first, cached);
    assert_eq!(first, recomputed);
}

#[tokio::test]
async fn test_proposer_list_is_byte_identical_across_cache_clears() {
    let h = harness(&active_validators(90), 4).await;
    let cancel = CancellationToken::new();

    for policy in [SelectionPolicy::Live, SelectionPolicy::Historical] {
        for epoch in [0, 3] {
            let mut encoded = Vec::new();
            for round in 0..3 {
                if round == 2 {
                    h.services.cache().clear();
                }
                let list = h
                    .services
                    .proposers
                    .proposer_list_for_epoch(epoch, policy, &cancel)
                    .await
                    .unwrap();
                encoded.push(serde_json::to_vec(&list).unwrap());
            }
            assert_eq!(encoded[0], encoded[1], "{:?} epoch {}", policy, epoch);
            assert_eq!(encoded[0], encoded[2], "{:?} epoch {}", policy, epoch);
        }
    }
}

#[tokio::test]
async fn test_consensus_info_range_from_genesis() {
    let h = harness(&active_validators(64), 5).await;
    let records = h
        .services
        .consensus_info
        .get_range(0, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(records.len(), 5);
    for (i, record) in records.iter().enumerate() {
        let epoch = i as u64;
        assert_eq!(record.epoch, epoch);
        assert_eq!(record.validator_list.len(), 8);
        assert_eq!(record.slot_time_duration, 6);
        assert_eq!(record.epoch_time_start, h.spec.genesis_time + epoch * 8 * 6);
    }
    assert_eq!(records[0].validator_list[0], PublicKey::zero().to_hex());
}

#[tokio::test]
async fn test_consensus_info_keys_follow_slot_order() {
    let h = harness(&active_validators(64), 3).await;
    let cancel = CancellationToken::new();
    let record = h.services.consensus_info.minimal_consensus_info(2, &cancel).await.unwrap();
    let list = h
        .services
        .proposers
        .proposer_list_for_epoch(2, SelectionPolicy::Historical, &cancel)
        .await
        .unwrap();

    let mut by_slot: Vec<(Slot, String)> = list
        .assignments
        .iter()
        .flat_map(|a| a.proposer_slots.iter().map(move |s| (*s, a.public_key.to_hex())))
        .collect();
    by_slot.sort();
    let expected: Vec<String> = by_slot.into_iter().map(|(_, key)| key).collect();
    assert_eq!(record.validator_list, expected);
}

#[tokio::test]
async fn test_consensus_info_range_beyond_head_fails() {
    let h = harness(&active_validators(16), 3).await;
    let err = h
        .services
        .consensus_info
        .get_range(7, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DutiesError::NotFound(_)), "{}", err);
}

#[tokio::test]
async fn test_consensus_info_range_stops_at_gap() {
    let validators = active_validators(32);
    let h = ChainHarness::new(ChainSpec::minimal());
    h.add_epoch_snapshots(0..3, &validators).await;
    h.add_epoch_snapshots(5..6, &validators).await;
    h.set_current_epoch(5);

    let records = h
        .services
        .consensus_info
        .get_range(1, &CancellationToken::new())
        .await
        .unwrap();
    let epochs: Vec<u64> = records.iter().map(|r| r.epoch).collect();
    assert_eq!(epochs, vec![1, 2]);
}

#[tokio::test]
async fn test_historical_accepts_mid_epoch_snapshot() {
    let validators = active_validators(32);
    let h = ChainHarness::new(ChainSpec::minimal());
    h.add_snapshot(0, &validators).await;
    // epoch 1 only retained at slot 11
    h.add_snapshot(11, &validators).await;
    h.set_current_epoch(1);
    let cancel = CancellationToken::new();

    let live = h
        .services
        .proposers
        .proposer_list_for_epoch(1, SelectionPolicy::Live, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(live, DutiesError::NotFound(_)));

    let record = h.services.consensus_info.minimal_consensus_info(1, &cancel).await.unwrap();
    assert_eq!(record.validator_list.len(), 8);
}

#[tokio::test]
async fn test_lookahead_does_not_change_range() {
    let validators = active_validators(48);
    let mut ranges = Vec::new();
    for lookahead in [1, 4, 16] {
        let h = ChainHarness::with_config(ServiceConfig {
            chain: ChainSpec::minimal(),
            scan: ScanConfig { lookahead },
            ..Default::default()
        });
        h.add_epoch_snapshots(0..6, &validators).await;
        h.set_current_epoch(5);
        ranges.push(
            h.services
                .consensus_info
                .get_range(0, &CancellationToken::new())
                .await
                .unwrap(),
        );
    }
    assert_eq!(ranges[0].len(), 6);
    assert_eq!(ranges[0], ranges[1]);
    assert_eq!(ranges[0], ranges[2]);
}

/// Memory store whose `calls_before_cancel`-th range read cancels `cancel` and never
/// returns.
struct CancellingStore {
    inner: MemorySnapshotStore,
    cancel: CancellationToken,
    reads: AtomicUsize,
    calls_before_cancel: usize,
}

#[async_trait]
impl SnapshotStore for CancellingStore {
    fn name(&self) -> String {
        "cancelling".into()
    }
    async fn put(&self, snapshot: BeaconSnapshot) -> anyhow::Result<()> {
        self.inner.put(snapshot).await
    }
    async fn state_by_slot(&self, slot: Slot) -> anyhow::Result<Option<Arc<BeaconSnapshot>>> {
        self.inner.state_by_slot(slot).await
    }
    async fn latest_state_in(
        &self,
        start: Slot,
        end: Slot,
    ) -> anyhow::Result<Option<Arc<BeaconSnapshot>>> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if read >= self.calls_before_cancel {
            self.cancel.cancel();
            std::future::pending::<()>().await;
        }
        self.inner.latest_state_in(start, end).await
    }
    async fn delete(&self, slot: Slot) -> anyhow::Result<()> {
        self.inner.delete(slot).await
    }
    async fn slots(&self) -> anyhow::Result<Vec<Slot>> {
        self.inner.slots().await
    }
}

#[tokio::test]
async fn test_cancelled_range_discards_partial_results() {
    use crate::consensus::clock::ManualSlotClock;
    use crate::consensus::pos::SeededSchedule;
    use crate::duties::{DutyServices, ScheduleCache};

    let spec = ChainSpec::minimal();
    let cancel = CancellationToken::new();
    let store = Arc::new(CancellingStore {
        inner: MemorySnapshotStore::new(),
        cancel: cancel.clone(),
        reads: AtomicUsize::new(0),
        calls_before_cancel: 3,
    });
    for epoch in 0..10 {
        store
            .put(BeaconSnapshot::new(epoch * 8, [7u8; 32], active_validators(32)))
            .await
            .unwrap();
    }
    let services = DutyServices::new(
        store.clone(),
        Arc::new(ManualSlotClock::new(9 * 8)),
        Arc::new(SeededSchedule::default()),
        ScheduleCache::new(),
        ServiceConfig { chain: spec, ..Default::default() },
    );

    let err = services.consensus_info.get_range(0, &cancel).await.unwrap_err();
    assert_eq!(err, DutiesError::Cancelled);
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let h = harness(&active_validators(16), 3).await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = h.services.consensus_info.get_range(0, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_rpc_end_to_end() {
    use jsonrpsee::core::ClientError;
    use jsonrpsee::http_client::HttpClientBuilder;

    let h = harness(&active_validators(40), 3).await;
    let shutdown = CancellationToken::new();
    let addr = "127.0.0.1:0".parse().unwrap();
    let server = RpcServer::new(addr, h.services.clone(), shutdown.clone());
    let (addr, handle) = server.start().await.unwrap();
    let client = HttpClientBuilder::default().build(format!("http://{}", addr)).unwrap();

    let proposers = client.get_proposer_list_for_epoch(1).await.unwrap();
    assert_eq!(proposers.epoch, 1);
    let slots: usize = proposers.assignments.iter().map(|a| a.proposer_slots.len()).sum();
    assert_eq!(slots, 8);

    let listing = client
        .list_validator_assignments(ListAssignmentsRequest { page_size: 10, ..request(2) })
        .await
        .unwrap();
    assert_eq!(listing.assignments.len(), 10);
    assert_eq!(listing.next_page_token, "1");
    assert_eq!(listing.total_size, 40);

    let range = client.get_minimal_consensus_info_range(0).await.unwrap();
    assert_eq!(range.len(), 3);

    match client
        .list_validator_assignments(ListAssignmentsRequest { page_size: 501, ..request(0) })
        .await
    {
        Err(ClientError::Call(err)) => {
            assert_eq!(err.code(), crate::rpc::handlers::INVALID_ARGUMENT_CODE)
        }
        other => panic!("unexpected response {:?}", other),
    }
    match client.get_minimal_consensus_info(9).await {
        Err(ClientError::Call(err)) => assert_eq!(err.code(), crate::rpc::handlers::NOT_FOUND_CODE),
        other => panic!("unexpected response {:?}", other),
    }

    shutdown.cancel();
    handle.stop().unwrap();
    handle.stopped().await;
}

#[test]
fn test_far_future_exit_is_active() {
    let v = Validator {
        public_key: validator_key(1),
        activation_epoch: 2,
        exit_epoch: FAR_FUTURE_EPOCH,
    };
    assert!(!v.is_active_at(1));
    assert!(v.is_active_at(u64::MAX - 1));
}
