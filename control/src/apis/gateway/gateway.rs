//! Gateway watch adapter
//!
//! A Gateway inherits its controller from the GatewayClass it names. The
//! class is resolved from the cache first and from the cluster otherwise.

use super::adapter::{AdapterOutcome, RelistTracker};
use super::funnel::{FunnelEvent, FunnelSender};
use super::object_store::ObjectStore;
use crate::apis::client::{ResourceClient, WatchEvent};
use crate::apis::metrics::record_watch_notification;
use crate::error::ControllerError;
use common::{GatewayKey, GatewayObject, ManagedObject, ObjectKey, ObjectKind};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct GatewayWatcher {
    client: Arc<dyn ResourceClient>,
    store: ObjectStore,
    funnel: FunnelSender,
    controller_name: String,
    relist: RelistTracker<GatewayKey>,
}

impl GatewayWatcher {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        store: ObjectStore,
        funnel: FunnelSender,
        controller_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            funnel,
            controller_name: controller_name.into(),
            relist: RelistTracker::default(),
        }
    }

    /// A Gateway is ours when the GatewayClass it names carries our
    /// controllerName.
    ///
    /// The cache only holds classes that already matched. A miss falls back
    /// to a cluster read, made after the cache lock is released.
    pub async fn is_relevant(&self, gateway: &GatewayObject) -> Result<bool, ControllerError> {
        if self.store.contains_class(&gateway.gateway_class_name) {
            return Ok(true);
        }

        let class = self
            .client
            .get_gateway_class(&gateway.gateway_class_name)
            .await?;
        Ok(class.is_some_and(|c| c.controller_name == self.controller_name))
    }

    /// Apply one watch notification to the cache
    pub async fn handle_event(
        &mut self,
        event: WatchEvent<GatewayObject>,
    ) -> Result<AdapterOutcome, ControllerError> {
        let outcome = match event {
            WatchEvent::Applied(gateway) => self.on_applied(gateway).await?,
            WatchEvent::Deleted(gateway) => self.evict(&gateway.key).await?,
            WatchEvent::RelistStarted => {
                debug!("Gateway watch re-listing");
                self.relist.start();
                AdapterOutcome::Ignored
            }
            WatchEvent::RelistDone => self.on_relist_done().await?,
        };

        record_watch_notification(ObjectKind::Gateway.as_str(), outcome.as_str());
        Ok(outcome)
    }

    async fn on_applied(
        &mut self,
        gateway: GatewayObject,
    ) -> Result<AdapterOutcome, ControllerError> {
        if !self.is_relevant(&gateway).await? {
            debug!(
                "Gateway {} references GatewayClass '{}', not ours",
                gateway.key, gateway.gateway_class_name
            );
            // Switched to a class we do not own.
            return self.evict(&gateway.key).await;
        }

        self.relist.observe(&gateway.key);
        let key = gateway.key();
        if !self.store.apply_gateway(gateway).is_write() {
            return Ok(AdapterOutcome::Unchanged);
        }

        debug!("Gateway {} changed, enqueueing", key);
        self.funnel.send(FunnelEvent::applied(key)).await?;
        Ok(AdapterOutcome::Enqueued)
    }

    async fn evict(&self, key: &GatewayKey) -> Result<AdapterOutcome, ControllerError> {
        let Some(removed) = self.store.remove_gateway(key) else {
            return Ok(AdapterOutcome::Ignored);
        };

        info!("Gateway {} removed from cache", removed.key);
        self.funnel.send(FunnelEvent::deleted(removed.key())).await?;
        Ok(AdapterOutcome::Enqueued)
    }

    async fn on_relist_done(&mut self) -> Result<AdapterOutcome, ControllerError> {
        let stale = self.relist.finish(self.store.gateway_keys());
        if stale.is_empty() {
            debug!("Gateway re-list complete");
            return Ok(AdapterOutcome::Unchanged);
        }

        info!(
            "Gateway re-list complete, {} gateway(s) deleted while disconnected",
            stale.len()
        );
        let mut outcome = AdapterOutcome::Unchanged;
        for key in stale {
            if self.store.remove_gateway(&key).is_some() {
                self.funnel
                    .send(FunnelEvent::deleted(ObjectKey::Gateway(key)))
                    .await?;
                outcome = AdapterOutcome::Enqueued;
            }
        }
        Ok(outcome)
    }

    /// Drive the Gateway watch until it ends or `shutdown` fires
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut stream = self.client.watch_gateways();

        info!("Starting Gateway watcher");

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    // The relevance check may call the cluster; keep it
                    // cancellable.
                    let handled = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        handled = self.handle_event(event) => handled,
                    };
                    match handled {
                        Ok(_) => {}
                        Err(ControllerError::FunnelClosed) => {
                            warn!("Event funnel closed, stopping Gateway watcher");
                            break;
                        }
                        Err(e) => error!("Gateway notification failed: {}", e),
                    }
                }
                Some(Err(e)) => warn!("Gateway watcher error: {}", e),
                None => {
                    warn!("Gateway watch stream ended");
                    break;
                }
            }
        }

        info!("Gateway watcher stopped");
    }
}
