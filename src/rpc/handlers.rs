use crate::consensus::types::Epoch;
use crate::duties::selector::SelectionPolicy;
use crate::duties::types::{ConsensusInfoRecord, ListAssignmentsRequest, ValidatorAssignments};
use crate::duties::DutyServices;
use crate::utils::errors::DutiesError;
use crate::utils::metrics::METRICS;
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const INVALID_ARGUMENT_CODE: i32 = -32602;
pub const NOT_FOUND_CODE: i32 = -32001;
pub const OUT_OF_RANGE_CODE: i32 = -32002;
pub const INTERNAL_ERROR_CODE: i32 = -32603;
pub const CANCELLED_CODE: i32 = -32800;

/// JSON-RPC surface of the duty services (namespace `beacon`).
#[rpc(server, client, namespace = "beacon")]
pub trait BeaconDutiesApi {
    /// Filtered, paginated duties of an epoch.
    #[method(name = "listValidatorAssignments")]
    async fn list_validator_assignments(
        &self,
        request: ListAssignmentsRequest,
    ) -> RpcResult<ValidatorAssignments>;

    #[method(name = "getProposerListForEpoch")]
    async fn get_proposer_list_for_epoch(&self, epoch: Epoch) -> RpcResult<ValidatorAssignments>;

    #[method(name = "nextEpochProposerList")]
    async fn next_epoch_proposer_list(&self) -> RpcResult<ValidatorAssignments>;

    #[method(name = "getMinimalConsensusInfo")]
    async fn get_minimal_consensus_info(&self, epoch: Epoch) -> RpcResult<ConsensusInfoRecord>;

    #[method(name = "getMinimalConsensusInfoRange")]
    async fn get_minimal_consensus_info_range(
        &self,
        from_epoch: Epoch,
    ) -> RpcResult<Vec<ConsensusInfoRecord>>;

    /// Counters in the Prometheus text format.
    #[method(name = "metrics")]
    fn metrics(&self) -> RpcResult<String>;
}

/// Map the service error taxonomy onto JSON-RPC error objects.
pub fn to_rpc_error(err: DutiesError) -> ErrorObjectOwned {
    let code = match &err {
        DutiesError::InvalidArgument(_) => INVALID_ARGUMENT_CODE,
        DutiesError::NotFound(_) => NOT_FOUND_CODE,
        DutiesError::OutOfRange(_) => OUT_OF_RANGE_CODE,
        DutiesError::Internal(_) => INTERNAL_ERROR_CODE,
        DutiesError::Cancelled => CANCELLED_CODE,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}

/// Serves `BeaconDutiesApi` from a set of duty services.
///
/// Each call runs under a child of the server's shutdown token.
pub struct DutiesRpc {
    services: Arc<DutyServices>,
    shutdown: CancellationToken,
}

impl DutiesRpc {
    pub fn new(services: Arc<DutyServices>, shutdown: CancellationToken) -> Self {
        Self { services, shutdown }
    }
}

#[async_trait]
impl BeaconDutiesApiServer for DutiesRpc {
    async fn list_validator_assignments(
        &self,
        request: ListAssignmentsRequest,
    ) -> RpcResult<ValidatorAssignments> {
        debug!(
            endpoint = "listValidatorAssignments",
            epoch = request.query_filter.epoch(),
            "RPC request"
        );
        let cancel = self.shutdown.child_token();
        self.services
            .assignments
            .list_validator_assignments(&request, &cancel)
            .await
            .map_err(to_rpc_error)
    }

    async fn get_proposer_list_for_epoch(&self, epoch: Epoch) -> RpcResult<ValidatorAssignments> {
        debug!(endpoint = "getProposerListForEpoch", epoch, "RPC request");
        let cancel = self.shutdown.child_token();
        self.services
            .proposers
            .proposer_list_for_epoch(epoch, SelectionPolicy::Live, &cancel)
            .await
            .map_err(to_rpc_error)
    }

    async fn next_epoch_proposer_list(&self) -> RpcResult<ValidatorAssignments> {
        debug!(endpoint = "nextEpochProposerList", "RPC request");
        let cancel = self.shutdown.child_token();
        self.services
            .proposers
            .next_epoch_proposer_list(&cancel)
            .await
            .map_err(to_rpc_error)
    }

    async fn get_minimal_consensus_info(&self, epoch: Epoch) -> RpcResult<ConsensusInfoRecord> {
        debug!(endpoint = "getMinimalConsensusInfo", epoch, "RPC request");
        let cancel = self.shutdown.child_token();
        self.services
            .consensus_info
            .minimal_consensus_info(epoch, &cancel)
            .await
            .map_err(to_rpc_error)
    }

    async fn get_minimal_consensus_info_range(
        &self,
        from_epoch: Epoch,
    ) -> RpcResult<Vec<ConsensusInfoRecord>> {
        debug!(endpoint = "getMinimalConsensusInfoRange", from_epoch, "RPC request");
        let cancel = self.shutdown.child_token();
        self.services
            .consensus_info
            .get_range(from_epoch, &cancel)
            .await
            .map_err(to_rpc_error)
    }

    fn metrics(&self) -> RpcResult<String> {
        Ok(METRICS.render())
    }
}
