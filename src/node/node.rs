//! Node orchestration: wire up storage, clock, schedule source, duty services and rpc.

use crate::consensus::clock::SystemTimeSlotClock;
use crate::consensus::pos::SeededSchedule;
use crate::duties::{DutyServices, ScheduleCache};
use crate::node::config::DutiesConfig;
use crate::node::service_handle::ServiceHandle;
use crate::rpc::server::RpcServer;
use crate::storage::{self, SnapshotStore, StorageEngine};
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main Node object
pub struct Node {
    cfg: DutiesConfig,
}

impl Node {
    pub fn new(cfg: DutiesConfig) -> Self {
        Self { cfg }
    }

    pub fn open_store(&self) -> Result<Arc<dyn SnapshotStore>> {
        let engine = match &self.cfg.storage.snapshots_dir {
            Some(dir) => StorageEngine::Fs(dir.clone()),
            None => StorageEngine::Memory,
        };
        storage::open(engine)
    }

    /// Duty services over the configured store and the wall clock.
    pub fn build_services(&self) -> Result<Arc<DutyServices>> {
        self.cfg.validate()?;
        let store = self.open_store()?;
        info!("Opened snapshot store {}", store.name());

        let chain = &self.cfg.chain;
        let clock = SystemTimeSlotClock::new(chain.genesis_time, chain.seconds_per_slot);

        Ok(Arc::new(DutyServices::new(
            store,
            Arc::new(clock),
            Arc::new(SeededSchedule::default()),
            ScheduleCache::new(),
            self.cfg.service_config(),
        )))
    }

    /// Start the node: spawn the rpc server and return a ServiceHandle for graceful shutdown,
    /// together with the address the server is bound to.
    pub async fn start(self) -> Result<(ServiceHandle, SocketAddr)> {
        let mut svc_handle = ServiceHandle::new();
        let services = self.build_services()?;

        let rpc_addr = self.cfg.rpc_addr()?;
        let shutdown = svc_handle.shutdown_token();
        let server = RpcServer::new(rpc_addr, services, shutdown.child_token());
        let (local_addr, server_handle) = server.start().await?;

        let h: JoinHandle<Result<()>> = tokio::spawn(async move {
            shutdown.cancelled().await;
            info!("RPC server shutting down");
            // already stopped is fine
            let _ = server_handle.stop();
            server_handle.stopped().await;
            Ok(())
        });
        svc_handle.attach(h);

        info!("Node started, RPC: {}", local_addr);
        Ok((svc_handle, local_addr))
    }
}
