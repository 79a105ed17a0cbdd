//! Cluster client
//!
//! The controller core never touches `kube::Api` directly. It talks to a
//! [`ResourceClient`], which the binary backs with [`KubeResourceClient`] and
//! the tests back with an in-memory fake.

use crate::error::ClientError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ClassObject, Condition, ConditionStatus, GatewayKey, GatewayObject, ObjectKind};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use gateway_api::apis::standard::gatewayclasses::GatewayClass;
use gateway_api::apis::standard::gateways::Gateway;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition as ApiCondition, Time};
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Client, ResourceExt};
use std::time::Duration;
use tracing::debug;

/// A change notification from a watch stream
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent<T> {
    /// Object created or updated
    Applied(T),
    /// Object removed from the cluster
    Deleted(T),
    /// The watch is (re)listing; every live object follows as `Applied`
    RelistStarted,
    /// Re-list complete; objects not replayed since `RelistStarted` are gone
    RelistDone,
}

pub type WatchStream<T> = BoxStream<'static, Result<WatchEvent<T>, ClientError>>;

/// What the controller needs from the cluster
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch a GatewayClass. `Ok(None)` means it does not exist.
    async fn get_gateway_class(&self, name: &str) -> Result<Option<ClassObject>, ClientError>;

    /// Merge-patch the status subresource of a GatewayClass.
    ///
    /// Returns the updated object, or `Ok(None)` if it no longer exists.
    async fn patch_gateway_class_status(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<Option<ClassObject>, ClientError>;

    /// Watch all GatewayClasses
    fn watch_gateway_classes(&self) -> WatchStream<ClassObject>;

    /// Watch Gateways in all namespaces
    fn watch_gateways(&self) -> WatchStream<GatewayObject>;
}

// =============================================================================
// Kubernetes implementation
// =============================================================================

/// [`ResourceClient`] over a real API server
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
    request_timeout: Duration,
}

impl KubeResourceClient {
    pub fn new(client: Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    fn gateway_classes(&self) -> Api<GatewayClass> {
        Api::all(self.client.clone())
    }

    /// Bound a single API call by the configured timeout
    async fn bounded<T>(
        &self,
        call: BoxFuture<'_, Result<T, kube::Error>>,
    ) -> Result<T, ClientError> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result.map_err(ClientError::from),
            Err(_) => Err(ClientError::Timeout(self.request_timeout)),
        }
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    async fn get_gateway_class(&self, name: &str) -> Result<Option<ClassObject>, ClientError> {
        let api = self.gateway_classes();
        let found = self.bounded(Box::pin(api.get_opt(name))).await?;
        found.as_ref().map(class_from_api).transpose()
    }

    async fn patch_gateway_class_status(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<Option<ClassObject>, ClientError> {
        let api = self.gateway_classes();
        let params = PatchParams::default();
        let merge = Patch::Merge(patch);
        match self
            .bounded(Box::pin(api.patch_status(name, &params, &merge)))
            .await
        {
            Ok(updated) => class_from_api(&updated).map(Some),
            Err(ClientError::Kube(kube::Error::Api(response))) if response.code == 404 => {
                debug!("GatewayClass {} vanished before status patch", name);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn watch_gateway_classes(&self) -> WatchStream<ClassObject> {
        let api = self.gateway_classes();
        watcher(api, watcher::Config::default())
            .default_backoff()
            .map_err(|e| ClientError::Watch {
                kind: ObjectKind::GatewayClass,
                message: e.to_string(),
            })
            .and_then(|event| async move { convert_event(event, class_from_api) })
            .boxed()
    }

    fn watch_gateways(&self) -> WatchStream<GatewayObject> {
        let api: Api<Gateway> = Api::all(self.client.clone());
        watcher(api, watcher::Config::default())
            .default_backoff()
            .map_err(|e| ClientError::Watch {
                kind: ObjectKind::Gateway,
                message: e.to_string(),
            })
            .and_then(|event| async move { convert_event(event, gateway_from_api) })
            .boxed()
    }
}

fn convert_event<K, T>(
    event: watcher::Event<K>,
    convert: fn(&K) -> Result<T, ClientError>,
) -> Result<WatchEvent<T>, ClientError> {
    Ok(match event {
        watcher::Event::Apply(obj) | watcher::Event::InitApply(obj) => {
            WatchEvent::Applied(convert(&obj)?)
        }
        watcher::Event::Delete(obj) => WatchEvent::Deleted(convert(&obj)?),
        watcher::Event::Init => WatchEvent::RelistStarted,
        watcher::Event::InitDone => WatchEvent::RelistDone,
    })
}

// =============================================================================
// Conversions from Gateway API types
// =============================================================================

/// Snapshot a GatewayClass
pub fn class_from_api(gc: &GatewayClass) -> Result<ClassObject, ClientError> {
    let name = gc
        .metadata
        .name
        .clone()
        .ok_or_else(|| ClientError::UnexpectedObject {
            kind: ObjectKind::GatewayClass,
            message: "metadata.name is missing".to_string(),
        })?;

    let conditions = gc
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| conds.iter().map(condition_from_api).collect())
        .unwrap_or_default();

    Ok(ClassObject {
        name,
        creation_timestamp: gc.metadata.creation_timestamp.as_ref().map(time),
        generation: gc.metadata.generation.unwrap_or_default(),
        controller_name: gc.spec.controller_name.clone(),
        deletion_timestamp: gc.metadata.deletion_timestamp.as_ref().map(time),
        finalizers: gc.finalizers().to_vec(),
        conditions,
    })
}

/// Snapshot a Gateway
pub fn gateway_from_api(gw: &Gateway) -> Result<GatewayObject, ClientError> {
    let name = gw
        .metadata
        .name
        .clone()
        .ok_or_else(|| ClientError::UnexpectedObject {
            kind: ObjectKind::Gateway,
            message: "metadata.name is missing".to_string(),
        })?;
    let namespace = gw.namespace().unwrap_or_else(|| "default".to_string());

    let conditions = gw
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| conds.iter().map(condition_from_api).collect())
        .unwrap_or_default();

    Ok(GatewayObject {
        key: GatewayKey::new(namespace, name),
        generation: gw.metadata.generation.unwrap_or_default(),
        gateway_class_name: gw.spec.gateway_class_name.clone(),
        conditions,
    })
}

fn condition_from_api(c: &ApiCondition) -> Condition {
    Condition {
        type_: c.type_.clone(),
        status: ConditionStatus::parse(&c.status),
        reason: c.reason.clone(),
        message: c.message.clone(),
        observed_generation: c.observed_generation.unwrap_or_default(),
        last_transition_time: time(&c.last_transition_time),
    }
}

fn time(t: &Time) -> DateTime<Utc> {
    t.0
}

// =============================================================================
// In-memory client for unit tests
// =============================================================================
