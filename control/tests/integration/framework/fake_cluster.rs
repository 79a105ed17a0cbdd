//! In-process cluster
//!
//! Holds GatewayClasses and Gateways, serves them through `ResourceClient`,
//! and pushes every change to the open watch streams the way the API server
//! would: a re-list on connect, then one notification per change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ClassObject, GatewayKey, GatewayObject, GATEWAY_CLASS_FINALIZER};
use control::{ClientError, ResourceClient, WatchEvent, WatchStream};
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

type Watchers<T> = Vec<UnboundedSender<Result<WatchEvent<T>, ClientError>>>;

#[derive(Default)]
struct ClusterState {
    classes: BTreeMap<String, ClassObject>,
    gateways: BTreeMap<GatewayKey, GatewayObject>,
    class_watchers: Watchers<ClassObject>,
    gateway_watchers: Watchers<GatewayObject>,
    patches: usize,
}

fn broadcast<T: Clone>(watchers: &mut Watchers<T>, event: WatchEvent<T>) {
    watchers.retain(|tx| tx.unbounded_send(Ok(event.clone())).is_ok());
}

fn relist<T: Clone>(tx: &UnboundedSender<Result<WatchEvent<T>, ClientError>>, objects: Vec<T>) {
    let _ = tx.unbounded_send(Ok(WatchEvent::RelistStarted));
    for object in objects {
        let _ = tx.unbounded_send(Ok(WatchEvent::Applied(object)));
    }
    let _ = tx.unbounded_send(Ok(WatchEvent::RelistDone));
}

#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<ClusterState>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().expect("cluster state poisoned")
    }

    // -------------------------------------------------------------------------
    // GatewayClasses
    // -------------------------------------------------------------------------

    pub fn create_class(&self, class: ClassObject) {
        let mut state = self.state();
        state.classes.insert(class.name.clone(), class.clone());
        broadcast(&mut state.class_watchers, WatchEvent::Applied(class));
    }

    /// Mutate a stored class and notify watchers
    pub fn update_class(&self, name: &str, update: impl FnOnce(&mut ClassObject)) {
        let mut state = self.state();
        let Some(class) = state.classes.get_mut(name) else {
            panic!("update of unknown gatewayclass {}", name);
        };
        update(class);
        let class = class.clone();
        broadcast(&mut state.class_watchers, WatchEvent::Applied(class));
    }

    /// Re-deliver a class unchanged, like a periodic resync
    pub fn touch_class(&self, name: &str) {
        self.update_class(name, |_| {});
    }

    /// Set the deletion timestamp. Finalizers keep the object around.
    pub fn mark_for_deletion(&self, name: &str, at: DateTime<Utc>) {
        self.update_class(name, |class| class.deletion_timestamp = Some(at));
    }

    pub fn remove_finalizer(&self, name: &str) {
        self.update_class(name, |class| {
            class.finalizers.retain(|f| f != GATEWAY_CLASS_FINALIZER)
        });
    }

    pub fn delete_class(&self, name: &str) {
        let mut state = self.state();
        if let Some(class) = state.classes.remove(name) {
            broadcast(&mut state.class_watchers, WatchEvent::Deleted(class));
        }
    }

    /// Delete without notifying anyone, as if the watch was disconnected
    pub fn delete_class_unobserved(&self, name: &str) {
        self.state().classes.remove(name);
    }

    /// Replay the full GatewayClass list on every open watch
    pub fn relist_classes(&self) {
        let state = self.state();
        let classes: Vec<_> = state.classes.values().cloned().collect();
        for tx in &state.class_watchers {
            relist(tx, classes.clone());
        }
    }

    pub fn class(&self, name: &str) -> Option<ClassObject> {
        self.state().classes.get(name).cloned()
    }

    pub fn patch_count(&self) -> usize {
        self.state().patches
    }

    // -------------------------------------------------------------------------
    // Gateways
    // -------------------------------------------------------------------------

    pub fn apply_gateway(&self, gateway: GatewayObject) {
        let mut state = self.state();
        state.gateways.insert(gateway.key.clone(), gateway.clone());
        broadcast(&mut state.gateway_watchers, WatchEvent::Applied(gateway));
    }

    pub fn delete_gateway(&self, key: &GatewayKey) {
        let mut state = self.state();
        if let Some(gateway) = state.gateways.remove(key) {
            broadcast(&mut state.gateway_watchers, WatchEvent::Deleted(gateway));
        }
    }
}

#[async_trait]
impl ResourceClient for FakeCluster {
    async fn get_gateway_class(&self, name: &str) -> Result<Option<ClassObject>, ClientError> {
        Ok(self.class(name))
    }

    async fn patch_gateway_class_status(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<Option<ClassObject>, ClientError> {
        let mut state = self.state();
        let Some(class) = state.classes.get_mut(name) else {
            return Ok(None);
        };
        if let Some(conditions) = patch.pointer("/status/conditions") {
            class.conditions = serde_json::from_value(conditions.clone())?;
        }
        let updated = class.clone();
        state.patches += 1;
        broadcast(&mut state.class_watchers, WatchEvent::Applied(updated.clone()));
        Ok(Some(updated))
    }

    fn watch_gateway_classes(&self) -> WatchStream<ClassObject> {
        let (tx, rx) = unbounded();
        let mut state = self.state();
        relist(&tx, state.classes.values().cloned().collect());
        state.class_watchers.push(tx);
        rx.boxed()
    }

    fn watch_gateways(&self) -> WatchStream<GatewayObject> {
        let (tx, rx) = unbounded();
        let mut state = self.state();
        relist(&tx, state.gateways.values().cloned().collect());
        state.gateway_watchers.push(tx);
        rx.boxed()
    }
}
