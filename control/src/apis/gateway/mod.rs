//! Gateway API support (v1)
//!
//! The coordination core of the controller:
//! - ObjectStore: shared cache of managed GatewayClasses and Gateways, with
//!   the election of the accepted GatewayClass
//! - Watch adapters: GatewayClass and Gateway notifications into the cache
//! - Funnel: many adapters, one ordered stream
//! - Processor: single consumer, sole writer of status

pub mod adapter;
pub mod funnel;
#[allow(clippy::module_inception)]
pub mod gateway;
pub mod gateway_class;
pub mod object_store;
pub mod processor;
pub mod status;

pub use adapter::AdapterOutcome;
pub use funnel::{BackpressurePolicy, Change, FunnelEvent, FunnelReceiver, FunnelSender};
pub use gateway::GatewayWatcher;
pub use gateway_class::GatewayClassWatcher;
pub use object_store::{ClassSnapshot, ObjectStore, ObjectStoreMetrics, StoreUpdate};
pub use processor::Processor;
pub use status::Acceptance;
