//! Test framework core infrastructure

pub mod assertions;
pub mod fake_cluster;
pub mod fixtures;

use control::{ControllerConfig, Manager, ObjectStore};
use fake_cluster::FakeCluster;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Test result type
pub type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A running controller against a fresh in-process cluster
pub struct TestContext {
    pub cluster: Arc<FakeCluster>,
    pub store: ObjectStore,
    pub timeout: Duration,
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl TestContext {
    /// Start the full pipeline. Must be called inside a Tokio runtime.
    pub fn start(config: ControllerConfig, timeout: Duration) -> Self {
        let cluster = Arc::new(FakeCluster::new());
        let manager = Manager::new(config, cluster.clone());
        let shutdown = CancellationToken::new();
        let handles = manager.spawn(shutdown.clone());

        Self {
            cluster,
            store: manager.store(),
            timeout,
            shutdown,
            handles,
        }
    }

    /// Poll `condition` until it holds or the timeout passes
    pub async fn wait_for<F>(&self, what: &str, mut condition: F) -> TestResult
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();

        while start.elapsed() < self.timeout {
            if condition() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Err(format!("timed out after {:?} waiting for {}", self.timeout, what).into())
    }

    /// Give in-flight events time to drain
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    /// Cancel every task and wait for them to finish
    pub async fn stop(self) -> TestResult {
        self.shutdown.cancel();
        for handle in self.handles {
            tokio::time::timeout(self.timeout, handle).await??;
        }
        Ok(())
    }
}
