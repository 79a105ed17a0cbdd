//! GatewayClass watch adapter
//!
//! Keeps the cache's matched set in line with the GatewayClasses that carry
//! our controllerName, and tells the processor whenever it changes.

use super::adapter::{AdapterOutcome, RelistTracker};
use super::funnel::{FunnelEvent, FunnelSender};
use super::object_store::ObjectStore;
use crate::apis::client::{ResourceClient, WatchEvent};
use crate::apis::metrics::record_watch_notification;
use crate::error::ControllerError;
use common::{ClassObject, ManagedObject, ObjectKey, ObjectKind};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct GatewayClassWatcher {
    client: Arc<dyn ResourceClient>,
    store: ObjectStore,
    funnel: FunnelSender,
    controller_name: String,
    relist: RelistTracker<String>,
}

impl GatewayClassWatcher {
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

    /// A GatewayClass is ours when its controllerName matches exactly
    pub fn is_relevant(&self, class: &ClassObject) -> bool {
        class.controller_name == self.controller_name
    }

    /// Apply one watch notification to the cache
    pub async fn handle_event(
        &mut self,
        event: WatchEvent<ClassObject>,
    ) -> Result<AdapterOutcome, ControllerError> {
        let outcome = match event {
            WatchEvent::Applied(class) => self.on_applied(class).await?,
            WatchEvent::Deleted(class) => self.evict(&class.name).await?,
            WatchEvent::RelistStarted => {
                debug!("GatewayClass watch re-listing");
                self.relist.start();
                AdapterOutcome::Ignored
            }
            WatchEvent::RelistDone => self.on_relist_done().await?,
        };

        record_watch_notification(ObjectKind::GatewayClass.as_str(), outcome.as_str());
        Ok(outcome)
    }

    async fn on_applied(&mut self, class: ClassObject) -> Result<AdapterOutcome, ControllerError> {
        if !self.is_relevant(&class) {
            // A class we cached that no longer names us has left the election.
            return self.evict(&class.name).await;
        }
        if class.is_finalized() {
            // Already gone as far as the cluster is concerned.
            return self.evict(&class.name).await;
        }

        self.relist.observe(&class.name);
        let key = class.key();
        if !self.store.apply_class(class).is_write() {
            return Ok(AdapterOutcome::Unchanged);
        }

        debug!("GatewayClass {} changed, enqueueing", key);
        self.funnel.send(FunnelEvent::applied(key)).await?;
        Ok(AdapterOutcome::Enqueued)
    }

    async fn evict(&self, name: &str) -> Result<AdapterOutcome, ControllerError> {
        let Some(removed) = self.store.remove_class(name) else {
            return Ok(AdapterOutcome::Ignored);
        };

        info!("GatewayClass {} removed from cache", removed.name);
        self.funnel.send(FunnelEvent::deleted(removed.key())).await?;
        Ok(AdapterOutcome::Enqueued)
    }

    async fn on_relist_done(&mut self) -> Result<AdapterOutcome, ControllerError> {
        let stale = self.relist.finish(self.store.class_names());
        if stale.is_empty() {
            debug!("GatewayClass re-list complete");
            return Ok(AdapterOutcome::Unchanged);
        }

        info!(
            "GatewayClass re-list complete, {} class(es) deleted while disconnected",
            stale.len()
        );
        let mut outcome = AdapterOutcome::Unchanged;
        for name in stale {
            if self.store.remove_class(&name).is_some() {
                self.funnel
                    .send(FunnelEvent::deleted(ObjectKey::GatewayClass(name)))
                    .await?;
                outcome = AdapterOutcome::Enqueued;
            }
        }
        Ok(outcome)
    }

    /// Drive the GatewayClass watch until it ends or `shutdown` fires
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut stream = self.client.watch_gateway_classes();

        info!(
            "Starting GatewayClass watcher for controller {}",
            self.controller_name
        );

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(event)) => match self.handle_event(event).await {
                    Ok(_) => {}
                    Err(ControllerError::FunnelClosed) => {
                        warn!("Event funnel closed, stopping GatewayClass watcher");
                        break;
                    }
                    Err(e) => error!("GatewayClass notification failed: {}", e),
                },
                Some(Err(e)) => warn!("GatewayClass watcher error: {}", e),
                None => {
                    warn!("GatewayClass watch stream ended");
                    break;
                }
            }
        }

        info!("GatewayClass watcher stopped");
    }
}
