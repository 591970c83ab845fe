use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Holds running tasks and the shutdown token for the node.
/// Call `shutdown()` to gracefully stop services.
pub struct ServiceHandle {
    shutdown: CancellationToken,
    join_handles: Vec<JoinHandle<Result<()>>>,
}

impl Default for ServiceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceHandle {
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            join_handles: vec![],
        }
    }

    /// Attach a background task handle (so we wait on it on shutdown).
    pub fn attach(&mut self, h: JoinHandle<Result<()>>) {
        self.join_handles.push(h);
    }

    /// Token cancelled on shutdown. In-flight requests run under children of it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Signal shutdown to all tasks and await them sequentially.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();

        for h in self.join_handles {
            match h.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("service task returned error: {:?}", e),
                Err(e) => tracing::error!("task join error: {:?}", e),
            }
        }
        Ok(())
    }
}
