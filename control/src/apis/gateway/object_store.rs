//! Object Store - shared cache of managed GatewayClasses and Gateways
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                            ObjectStore                               │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  Data (Arc<Mutex<StoreInner>>)          │  Metrics (atomics)         │
//! │  ┌──────────────────────────────────┐   │  ┌──────────────────────┐  │
//! │  │ matched: name → ClassObject      │   │  │ class_writes         │  │
//! │  │ oldest:  Option<name>            │   │  │ gateway_writes       │  │
//! │  │ gateways: (ns, name) → Gateway   │   │  │ suppressed           │  │
//! │  └──────────────────────────────────┘   │  │ evictions            │  │
//! │                                         │  └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! - `oldest` is empty exactly when `matched` is empty, and otherwise names
//!   the minimum of `matched` under [`election_order`].
//! - `oldest` is recomputed inside the same critical section as every write,
//!   so no reader ever sees it lag behind `matched`.
//! - Entries are value snapshots. Readers get clones.
//!
//! One mutex covers the whole store. GatewayClasses sharing a controller
//! name are few, so contention is low.

use common::{
    elect, election_order, is_older, ClassObject, GatewayKey, GatewayObject, ManagedObject,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Result of offering a snapshot to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreUpdate {
    /// First time this key was seen
    Created,
    /// Replaced a different snapshot
    Updated,
    /// Identical to the stored snapshot; nothing written
    Unchanged,
}

impl StoreUpdate {
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreUpdate::Unchanged)
    }
}

/// Election outcome read under a single lock acquisition
#[derive(Debug, Clone, Default)]
pub struct ClassSnapshot {
    pub accepted: Option<ClassObject>,
    pub not_accepted: Vec<ClassObject>,
}

impl ClassSnapshot {
    /// Accepted first, then the displaced classes in election order
    pub fn all(&self) -> impl Iterator<Item = &ClassObject> {
        self.accepted.iter().chain(self.not_accepted.iter())
    }

    pub fn len(&self) -> usize {
        self.not_accepted.len() + usize::from(self.accepted.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// ObjectStoreMetrics - Lock-free atomic counters
// =============================================================================

/// Lock-free counters for store writes
#[derive(Debug, Default)]
pub struct ObjectStoreMetrics {
    class_writes: AtomicU64,
    gateway_writes: AtomicU64,
    /// Snapshots dropped because they matched the stored copy
    suppressed: AtomicU64,
    evictions: AtomicU64,
}

impl ObjectStoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    fn record_class_write(&self) {
        self.class_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    fn record_gateway_write(&self) {
        self.gateway_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    fn record_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn class_writes(&self) -> u64 {
        self.class_writes.load(Ordering::Relaxed)
    }

    pub fn gateway_writes(&self) -> u64 {
        self.gateway_writes.load(Ordering::Relaxed)
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Format metrics in Prometheus exposition format
    pub fn to_prometheus(&self) -> String {
        format!(
            r#"# HELP object_store_class_writes_total GatewayClass snapshots written to the cache
# TYPE object_store_class_writes_total counter
object_store_class_writes_total {class_writes}
# HELP object_store_gateway_writes_total Gateway snapshots written to the cache
# TYPE object_store_gateway_writes_total counter
object_store_gateway_writes_total {gateway_writes}
# HELP object_store_suppressed_total Unchanged snapshots dropped without a write
# TYPE object_store_suppressed_total counter
object_store_suppressed_total {suppressed}
# HELP object_store_evictions_total Finalized GatewayClasses evicted from the cache
# TYPE object_store_evictions_total counter
object_store_evictions_total {evictions}
"#,
            class_writes = self.class_writes(),
            gateway_writes = self.gateway_writes(),
            suppressed = self.suppressed(),
            evictions = self.evictions(),
        )
    }
}

// =============================================================================
// ManagedClasses - matched set plus elected oldest
// =============================================================================

#[derive(Debug, Default)]
struct ManagedClasses {
    matched: HashMap<String, ClassObject>,
    oldest: Option<String>,
}

impl ManagedClasses {
    fn add(&mut self, class: ClassObject) {
        let name = class.name.clone();
        self.matched.insert(name.clone(), class);

        let current = self.oldest.clone();
        match current {
            None => self.oldest = Some(name),
            // Replacing the current winner: its position may have moved.
            Some(current) if current == name => self.reelect(),
            Some(current) => {
                let beats_current = match (self.matched.get(&name), self.matched.get(&current)) {
                    (Some(challenger), Some(oldest)) => Some(is_older(challenger, oldest)),
                    _ => None,
                };
                match beats_current {
                    Some(true) => self.oldest = Some(name),
                    Some(false) => {}
                    None => self.reelect(),
                }
            }
        }
    }

    fn remove(&mut self, name: &str) -> Option<ClassObject> {
        let removed = self.matched.remove(name)?;
        if self.oldest.as_deref() == Some(name) {
            self.reelect();
        }
        Some(removed)
    }

    /// O(n) scan for the new minimum
    fn reelect(&mut self) {
        self.oldest = elect(self.matched.values()).map(|c| c.name.clone());
    }

    fn accepted(&self) -> Option<&ClassObject> {
        self.oldest.as_ref().and_then(|name| self.matched.get(name))
    }

    fn not_accepted(&self) -> Vec<ClassObject> {
        let mut rest: Vec<ClassObject> = self
            .matched
            .values()
            .filter(|c| Some(c.name.as_str()) != self.oldest.as_deref())
            .cloned()
            .collect();
        rest.sort_by(election_order);
        rest
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    classes: ManagedClasses,
    gateways: HashMap<GatewayKey, GatewayObject>,
}

// =============================================================================
// ObjectStore
// =============================================================================

/// Thread-safe cache of managed objects
///
/// Cloning is cheap and shares the same underlying data. Every public
/// operation takes the lock once and releases it before returning, so no
/// caller ever holds it across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    inner: Arc<Mutex<StoreInner>>,
    metrics: Arc<ObjectStoreMetrics>,
}

/// Mutex lock helper that recovers from poisoning
#[inline]
fn safe_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        warn!("ObjectStore mutex poisoned, recovering (data is still valid)");
        poisoned.into_inner()
    })
}

/// Everything but the status conditions matches
fn same_apart_from_conditions(a: &ClassObject, b: &ClassObject) -> bool {
    a.name == b.name
        && a.creation_timestamp == b.creation_timestamp
        && a.generation == b.generation
        && a.controller_name == b.controller_name
        && a.deletion_timestamp == b.deletion_timestamp
        && a.finalizers == b.finalizers
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        safe_lock(&self.inner)
    }

    // -------------------------------------------------------------------------
    // GatewayClasses
    // -------------------------------------------------------------------------

    /// Insert or replace a GatewayClass snapshot and re-run the election
    pub fn add_class(&self, class: ClassObject) {
        let mut inner = self.lock();
        inner.classes.add(class);
        self.metrics.record_class_write();
    }

    /// Store the snapshot only if it differs from the cached one.
    ///
    /// Comparison and write happen under one lock acquisition.
    pub fn apply_class(&self, class: ClassObject) -> StoreUpdate {
        let mut inner = self.lock();
        let update = match inner.classes.matched.get(&class.name) {
            None => StoreUpdate::Created,
            Some(existing) if existing.same_snapshot(&class) => StoreUpdate::Unchanged,
            Some(_) => StoreUpdate::Updated,
        };

        if update.is_write() {
            debug!("ObjectStore: {:?} gatewayclass {}", update, class.name);
            inner.classes.add(class);
            self.metrics.record_class_write();
        } else {
            self.metrics.record_suppressed();
        }
        update
    }

    /// Take the conditions from a status write response.
    ///
    /// Only applies when the response differs from the cached snapshot in
    /// its conditions alone. Anything else changed in the cluster is left
    /// for the watch, so its notification still counts as an update. Does
    /// nothing if the class was evicted in the meantime. Returns whether a
    /// write happened.
    pub fn refresh_class(&self, class: ClassObject) -> bool {
        let mut inner = self.lock();
        match inner.classes.matched.get(&class.name) {
            Some(cached) if same_apart_from_conditions(cached, &class) => {}
            Some(_) => {
                debug!(
                    "ObjectStore: gatewayclass {} moved on during status write, left for the watch",
                    class.name
                );
                return false;
            }
            None => return false,
        }
        inner.classes.add(class);
        self.metrics.record_class_write();
        true
    }

    /// Remove a GatewayClass; promotes the next-oldest if it was accepted
    pub fn remove_class(&self, name: &str) -> Option<ClassObject> {
        let mut inner = self.lock();
        inner.classes.remove(name)
    }

    /// Evict every class that is marked for deletion and no longer holds
    /// the gateways-exist finalizer
    pub fn evict_finalized_classes(&self) -> Vec<ClassObject> {
        let mut inner = self.lock();
        let finalized: Vec<String> = inner
            .classes
            .matched
            .values()
            .filter(|c| c.is_finalized())
            .map(|c| c.name.clone())
            .collect();

        let evicted: Vec<ClassObject> = finalized
            .iter()
            .filter_map(|name| inner.classes.remove(name))
            .collect();
        for class in &evicted {
            self.metrics.record_eviction();
            debug!("ObjectStore: evicted finalized gatewayclass {}", class.name);
        }
        evicted
    }

    /// The accepted GatewayClass, if any class is known
    pub fn accepted_class(&self) -> Option<ClassObject> {
        self.lock().classes.accepted().cloned()
    }

    /// Every matched class except the accepted one, in election order
    pub fn not_accepted_classes(&self) -> Vec<ClassObject> {
        self.lock().classes.not_accepted()
    }

    /// Accepted first, then the rest in election order
    pub fn all_classes(&self) -> Vec<ClassObject> {
        self.class_snapshot().all().cloned().collect()
    }

    /// Accepted and displaced classes from a single lock acquisition
    pub fn class_snapshot(&self) -> ClassSnapshot {
        let inner = self.lock();
        ClassSnapshot {
            accepted: inner.classes.accepted().cloned(),
            not_accepted: inner.classes.not_accepted(),
        }
    }

    pub fn class(&self, name: &str) -> Option<ClassObject> {
        self.lock().classes.matched.get(name).cloned()
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.lock().classes.matched.contains_key(name)
    }

    pub fn class_names(&self) -> Vec<String> {
        self.lock().classes.matched.keys().cloned().collect()
    }

    pub fn class_count(&self) -> usize {
        self.lock().classes.matched.len()
    }

    // -------------------------------------------------------------------------
    // Gateways
    // -------------------------------------------------------------------------

    /// Store the Gateway snapshot only if it differs from the cached one
    pub fn apply_gateway(&self, gateway: GatewayObject) -> StoreUpdate {
        let mut inner = self.lock();
        let update = match inner.gateways.get(&gateway.key) {
            None => StoreUpdate::Created,
            Some(existing) if existing.same_snapshot(&gateway) => StoreUpdate::Unchanged,
            Some(_) => StoreUpdate::Updated,
        };

        if update.is_write() {
            debug!("ObjectStore: {:?} gateway {}", update, gateway.key);
            inner.gateways.insert(gateway.key.clone(), gateway);
            self.metrics.record_gateway_write();
        } else {
            self.metrics.record_suppressed();
        }
        update
    }

    pub fn gateway(&self, key: &GatewayKey) -> Option<GatewayObject> {
        self.lock().gateways.get(key).cloned()
    }

    pub fn remove_gateway(&self, key: &GatewayKey) -> Option<GatewayObject> {
        self.lock().gateways.remove(key)
    }

    pub fn contains_gateway(&self, key: &GatewayKey) -> bool {
        self.lock().gateways.contains_key(key)
    }

    pub fn gateway_keys(&self) -> Vec<GatewayKey> {
        self.lock().gateways.keys().cloned().collect()
    }

    pub fn gateway_count(&self) -> usize {
        self.lock().gateways.len()
    }

    /// Get metrics reference (for testing/debugging)
    pub fn metrics(&self) -> &ObjectStoreMetrics {
        &self.metrics
    }

    /// Format metrics in Prometheus exposition format
    pub fn prometheus_metrics(&self) -> String {
        let (classes, gateways) = {
            let inner = self.lock();
            (inner.classes.matched.len(), inner.gateways.len())
        };
        format!(
            "{base}# HELP object_store_size Objects currently cached\n# TYPE object_store_size gauge\nobject_store_size{{kind=\"gatewayclass\"}} {classes}\nobject_store_size{{kind=\"gateway\"}} {gateways}\n",
            base = self.metrics.to_prometheus(),
        )
    }
}

impl fmt::Display for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        match inner.classes.accepted() {
            Some(accepted) => write!(
                f,
                "ObjectStore: {} gatewayclass(es), accepted={}, {} gateway(s)",
                inner.classes.matched.len(),
                accepted.name,
                inner.gateways.len()
            ),
            None => write!(
                f,
                "ObjectStore: no accepted gatewayclass, {} gateway(s)",
                inner.gateways.len()
            ),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
