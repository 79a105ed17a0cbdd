//! End-to-end scenarios

pub mod election;
pub mod finalizer;
pub mod gateway_tracking;
pub mod relist;
pub mod suppression;
