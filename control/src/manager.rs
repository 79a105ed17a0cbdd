//! Manager - wires the pipeline together
//!
//! ```text
//! GatewayClassWatcher ──┐
//!                       ├──► funnel ──► Processor ──► status patches
//! GatewayWatcher ───────┘        ▲
//!        │                       │
//!        └──── ObjectStore ◄─────┘
//! ```

use crate::admin::Readiness;
use crate::apis::client::ResourceClient;
use crate::apis::gateway::{self, GatewayClassWatcher, GatewayWatcher, ObjectStore, Processor};
use crate::config::ControllerConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct Manager {
    config: ControllerConfig,
    client: Arc<dyn ResourceClient>,
    store: ObjectStore,
    readiness: Readiness,
}

impl Manager {
    pub fn new(config: ControllerConfig, client: Arc<dyn ResourceClient>) -> Self {
        Self {
            config,
            client,
            store: ObjectStore::new(),
            readiness: Readiness::default(),
        }
    }

    /// Shared handle to the cache
    pub fn store(&self) -> ObjectStore {
        self.store.clone()
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    /// Spawn the processor and both watch adapters.
    ///
    /// Every task stops when `shutdown` is cancelled. Readiness flips on
    /// once all of them are running.
    pub fn spawn(&self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let (tx, rx) = gateway::funnel::channel(self.config.funnel_capacity);

        let processor = Processor::new(
            self.client.clone(),
            self.store.clone(),
            rx,
            self.config.status_retry.clone(),
        );
        let class_watcher = GatewayClassWatcher::new(
            self.client.clone(),
            self.store.clone(),
            tx.clone(),
            self.config.controller_name.clone(),
        );
        let gateway_watcher = GatewayWatcher::new(
            self.client.clone(),
            self.store.clone(),
            tx,
            self.config.controller_name.clone(),
        );

        let handles = vec![
            tokio::spawn(processor.run(shutdown.clone())),
            tokio::spawn(class_watcher.run(shutdown.clone())),
            tokio::spawn(gateway_watcher.run(shutdown)),
        ];

        self.readiness.set_ready(true);
        info!(
            "Controller {} running (funnel capacity {})",
            self.config.controller_name, self.config.funnel_capacity
        );
        handles
    }
}
