//! Managed objects
//!
//! Snapshots of the two resource kinds the controller watches. Snapshots are
//! plain values: the cache stores copies, never live references, so a reader
//! can never observe a half-applied update.

use crate::condition::{conditions_equivalent, find_condition, Condition};
use chrono::{DateTime, Utc};
use std::fmt;

/// Finalizer Gateway API reserves for "gateways still reference this class"
pub const GATEWAY_CLASS_FINALIZER: &str = "gateway-exists-finalizer.gateway.networking.k8s.io";

// =============================================================================
// Keys and kinds
// =============================================================================

/// Resource kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    GatewayClass,
    Gateway,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::GatewayClass => "gatewayclass",
            ObjectKind::Gateway => "gateway",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key for Gateway lookup: (namespace, name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GatewayKey {
    pub namespace: String,
    pub name: String,
}

impl GatewayKey {
    #[inline]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for GatewayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Identity of a managed object, tagged by kind
///
/// GatewayClasses are cluster-scoped and keyed by name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKey {
    GatewayClass(String),
    Gateway(GatewayKey),
}

impl ObjectKey {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectKey::GatewayClass(_) => ObjectKind::GatewayClass,
            ObjectKey::Gateway(_) => ObjectKind::Gateway,
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKey::GatewayClass(name) => write!(f, "gatewayclass/{}", name),
            ObjectKey::Gateway(key) => write!(f, "gateway/{}", key),
        }
    }
}

/// Capabilities every cached object provides
pub trait ManagedObject {
    /// Tagged identity
    fn key(&self) -> ObjectKey;

    /// Kind tag
    fn kind(&self) -> ObjectKind {
        self.key().kind()
    }

    /// Comparable-snapshot equality: every field, except condition
    /// transition times.
    fn same_snapshot(&self, other: &Self) -> bool;
}

// =============================================================================
// ClassObject
// =============================================================================

/// Snapshot of a GatewayClass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassObject {
    pub name: String,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub generation: i64,
    /// The `spec.controllerName` this class is claimed by
    pub controller_name: String,
    pub deletion_timestamp: Option<DateTime<Utc>>,
    pub finalizers: Vec<String>,
    pub conditions: Vec<Condition>,
}

impl ClassObject {
    pub fn new(
        name: impl Into<String>,
        controller_name: impl Into<String>,
        creation_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            creation_timestamp: Some(creation_timestamp),
            generation: 1,
            controller_name: controller_name.into(),
            deletion_timestamp: None,
            finalizers: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// The object carries a deletion timestamp
    pub fn is_marked_for_deletion(&self) -> bool {
        self.deletion_timestamp.is_some()
    }

    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.finalizers.iter().any(|f| f == finalizer)
    }

    /// Tombstoned and no longer held by the gateways-exist finalizer.
    ///
    /// From the cluster's point of view such a class is already gone.
    pub fn is_finalized(&self) -> bool {
        self.is_marked_for_deletion() && !self.has_finalizer(GATEWAY_CLASS_FINALIZER)
    }

    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        find_condition(&self.conditions, type_)
    }
}

impl ManagedObject for ClassObject {
    fn key(&self) -> ObjectKey {
        ObjectKey::GatewayClass(self.name.clone())
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::GatewayClass
    }

    fn same_snapshot(&self, other: &Self) -> bool {
        self.name == other.name
            && self.creation_timestamp == other.creation_timestamp
            && self.generation == other.generation
            && self.controller_name == other.controller_name
            && self.deletion_timestamp == other.deletion_timestamp
            && self.finalizers == other.finalizers
            && conditions_equivalent(&self.conditions, &other.conditions)
    }
}

// =============================================================================
// GatewayObject
// =============================================================================

/// Snapshot of a Gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayObject {
    pub key: GatewayKey,
    pub generation: i64,
    /// `spec.gatewayClassName`
    pub gateway_class_name: String,
    pub conditions: Vec<Condition>,
}

impl GatewayObject {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        gateway_class_name: impl Into<String>,
    ) -> Self {
        Self {
            key: GatewayKey::new(namespace, name),
            generation: 1,
            gateway_class_name: gateway_class_name.into(),
            conditions: Vec::new(),
        }
    }
}

impl ManagedObject for GatewayObject {
    fn key(&self) -> ObjectKey {
        ObjectKey::Gateway(self.key.clone())
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Gateway
    }

    fn same_snapshot(&self, other: &Self) -> bool {
        self.key == other.key
            && self.generation == other.generation
            && self.gateway_class_name == other.gateway_class_name
            && conditions_equivalent(&self.conditions, &other.conditions)
    }
}
