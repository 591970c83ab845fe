use crate::duties::DutyServices;
use crate::rpc::handlers::{BeaconDutiesApiServer, DutiesRpc};
use jsonrpsee::server::{Server, ServerHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// RpcServer ties together the HTTP/WS JSON-RPC server and the duty services.
pub struct RpcServer {
    addr: SocketAddr,
    services: Arc<DutyServices>,
    shutdown: CancellationToken,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, services: Arc<DutyServices>, shutdown: CancellationToken) -> Self {
        Self { addr, services, shutdown }
    }

    /// Bind and start serving. Returns the bound address and the server handle.
    pub async fn start(self) -> anyhow::Result<(SocketAddr, ServerHandle)> {
        let server = Server::builder().build(self.addr).await?;
        let local_addr = server.local_addr()?;
        let module = DutiesRpc::new(self.services, self.shutdown).into_rpc();
        let handle = server.start(module);

        info!("Starting RPC server on {}", local_addr);
        Ok((local_addr, handle))
    }
}
