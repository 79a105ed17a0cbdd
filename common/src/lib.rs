//! Gatewarden Common Types
//!
//! Core data structures for GatewayClass ownership: the managed objects we
//! cache, the status conditions we publish, and the deterministic election
//! order that picks the one accepted GatewayClass per controller.
//!
//! Nothing in here talks to a cluster. The `control` crate converts API
//! objects into these types at the edge.

pub mod condition;
pub mod election;
pub mod object;

pub use condition::{
    conditions_equivalent, find_condition, set_condition, Condition, ConditionStatus,
    CONDITION_ACCEPTED, REASON_ACCEPTED, REASON_OLDER_GATEWAY_CLASS_EXISTS,
};
pub use election::{elect, election_order, is_older};
pub use object::{
    ClassObject, GatewayKey, GatewayObject, ManagedObject, ObjectKey, ObjectKind,
    GATEWAY_CLASS_FINALIZER,
};
