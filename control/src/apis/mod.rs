//! Kubernetes API integrations
//!
//! The cluster client seam, the Gateway API coordination core and the
//! controller metrics registry.

pub mod client;
pub mod gateway;
pub mod metrics;
