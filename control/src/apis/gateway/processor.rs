//! Processor - the single writer of status
//!
//! Consumes the event funnel one event at a time. Status writes and election
//! reads are therefore never concurrent with each other; only the watch
//! adapters write the cache in parallel, and they go through its lock.
//!
//! ## Per event
//!
//! ```text
//! GatewayClass event ──► evict finalized ──► key cached or Deleted? ──► reconcile all
//!                                                                       (accepted first)
//! Gateway event ───────► key cached? ──► reconcile_gateway
//! ```

use super::funnel::{Change, FunnelEvent, FunnelReceiver};
use super::object_store::ObjectStore;
use super::status::{desired_conditions, status_patch, Acceptance};
use crate::apis::client::ResourceClient;
use crate::apis::metrics::{
    record_gateway_reconciliation, record_gatewayclass_reconciliation, record_status_patch,
    set_managed_objects,
};
use crate::config::RetryConfig;
use crate::error::ControllerError;
use chrono::Utc;
use common::{ClassObject, GatewayKey, ObjectKey, ObjectKind};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a status write ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    /// Already correct; no call made
    UpToDate,
    Patched,
    /// The class vanished and was evicted from the cache
    Evicted,
}

pub struct Processor {
    client: Arc<dyn ResourceClient>,
    store: ObjectStore,
    funnel: FunnelReceiver,
    retry: RetryConfig,
}

impl Processor {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        store: ObjectStore,
        funnel: FunnelReceiver,
        retry: RetryConfig,
    ) -> Self {
        Self {
            client,
            store,
            funnel,
            retry,
        }
    }

    /// Consume events until the funnel closes or `shutdown` fires.
    ///
    /// A failed event is logged and dropped. The next notification for the
    /// same object retries it.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Starting processor");

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.funnel.recv() => match event {
                    Some(event) => event,
                    None => {
                        info!("Event funnel closed");
                        break;
                    }
                },
            };

            let result = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.process(&event) => result,
            };
            if let Err(e) = result {
                error!("Processing {} failed: {}", event, e);
            }
        }

        info!("Processor stopped");
    }

    /// Handle one event, dispatching on its kind
    pub async fn process(&self, event: &FunnelEvent) -> Result<(), ControllerError> {
        debug!("Processing {}", event);

        let result = match &event.key {
            ObjectKey::GatewayClass(name) => self.process_class_event(name, event.change).await,
            ObjectKey::Gateway(key) => self.reconcile_gateway(key).await.map(|_| ()),
        };

        set_managed_objects(ObjectKind::GatewayClass.as_str(), self.store.class_count());
        set_managed_objects(ObjectKind::Gateway.as_str(), self.store.gateway_count());
        result
    }

    async fn process_class_event(&self, name: &str, change: Change) -> Result<(), ControllerError> {
        let evicted = self.store.evict_finalized_classes();
        for class in &evicted {
            info!(
                "GatewayClass {} is finalized, evicted without status write",
                class.name
            );
        }

        // After a removal the survivors still need re-evaluating.
        let removed = change == Change::Deleted || !evicted.is_empty();
        if !removed && !self.store.contains_class(name) {
            debug!("GatewayClass {} not cached, nothing to reconcile", name);
            return Ok(());
        }

        self.reconcile_classes().await
    }

    /// Bring every cached class's `Accepted` condition in line with the
    /// election, accepted class first.
    ///
    /// A class found missing during its patch is evicted, which can change
    /// the election, so the pass restarts from a fresh snapshot. The first
    /// error of any pass is returned once the last pass completes.
    async fn reconcile_classes(&self) -> Result<(), ControllerError> {
        // Survives restarts so a failure before an eviction is still reported.
        let mut first_error = None;
        'pass: loop {
            let snapshot = self.store.class_snapshot();
            if snapshot.accepted.is_none() && !snapshot.not_accepted.is_empty() {
                return Err(ControllerError::ElectionInvariant(format!(
                    "no accepted gatewayclass among {} cached",
                    snapshot.not_accepted.len()
                )));
            }

            let targets = snapshot
                .accepted
                .iter()
                .map(|c| (c, Acceptance::Accepted))
                .chain(
                    snapshot
                        .not_accepted
                        .iter()
                        .map(|c| (c, Acceptance::Displaced)),
                );

            for (class, acceptance) in targets {
                match self.reconcile_class(class, acceptance).await {
                    Ok(WriteOutcome::Evicted) => continue 'pass,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("GatewayClass {} status not written: {}", class.name, e);
                        first_error.get_or_insert(e);
                    }
                }
            }

            return match first_error {
                Some(e) => Err(e),
                None => Ok(()),
            };
        }
    }

    async fn reconcile_class(
        &self,
        class: &ClassObject,
        acceptance: Acceptance,
    ) -> Result<WriteOutcome, ControllerError> {
        let start = Instant::now();
        let result = self.write_status(class, acceptance).await;

        let label = match &result {
            Ok(WriteOutcome::UpToDate) => "unchanged",
            Ok(WriteOutcome::Patched) => "success",
            Ok(WriteOutcome::Evicted) => "not_found",
            Err(_) => "error",
        };
        record_gatewayclass_reconciliation(&class.name, start.elapsed().as_secs_f64(), label);
        result
    }

    /// Patch the `Accepted` condition if it differs, with bounded retries
    async fn write_status(
        &self,
        class: &ClassObject,
        acceptance: Acceptance,
    ) -> Result<WriteOutcome, ControllerError> {
        let Some(conditions) = desired_conditions(class, acceptance, Utc::now()) else {
            debug!(
                "GatewayClass {} already {}, no patch",
                class.name,
                acceptance.as_str()
            );
            return Ok(WriteOutcome::UpToDate);
        };
        let patch = status_patch(&conditions);

        let mut attempt = 1;
        loop {
            match self
                .client
                .patch_gateway_class_status(&class.name, &patch)
                .await
            {
                Ok(Some(updated)) => {
                    record_status_patch(ObjectKind::GatewayClass.as_str(), "success");
                    info!(
                        "Updated GatewayClass {} status: {}",
                        class.name,
                        acceptance.as_str()
                    );
                    self.store.refresh_class(updated);
                    return Ok(WriteOutcome::Patched);
                }
                Ok(None) => {
                    record_status_patch(ObjectKind::GatewayClass.as_str(), "not_found");
                    debug!("GatewayClass {} is gone, evicting", class.name);
                    self.store.remove_class(&class.name);
                    return Ok(WriteOutcome::Evicted);
                }
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    record_status_patch(ObjectKind::GatewayClass.as_str(), "retry");
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        "GatewayClass {} status patch attempt {} failed: {}, retrying in {:?}",
                        class.name, attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    record_status_patch(ObjectKind::GatewayClass.as_str(), "error");
                    return Err(e.into());
                }
            }
        }
    }

    /// Gateway reconciliation hook.
    ///
    /// Reports whether the Gateway is actionable, meaning its class is the
    /// accepted one. Nothing is provisioned or written.
    pub async fn reconcile_gateway(&self, key: &GatewayKey) -> Result<bool, ControllerError> {
        let Some(gateway) = self.store.gateway(key) else {
            debug!("Gateway {} not cached, nothing to reconcile", key);
            return Ok(false);
        };

        let start = Instant::now();
        let actionable = self
            .store
            .accepted_class()
            .is_some_and(|accepted| accepted.name == gateway.gateway_class_name);

        debug!(
            "Gateway {} (class {}) actionable={}",
            key, gateway.gateway_class_name, actionable
        );
        record_gateway_reconciliation(
            &key.name,
            &key.namespace,
            start.elapsed().as_secs_f64(),
            "success",
        );
        Ok(actionable)
    }
}
