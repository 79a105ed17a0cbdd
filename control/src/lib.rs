//! Gatewarden Control Plane Library
//!
//! Elects one accepted GatewayClass among those claiming our controller name
//! and keeps their `Accepted` status conditions in line with the election.
//! Exposes the pipeline pieces for the binary and the scenario tests.

pub mod admin;
pub mod apis;
pub mod config;
pub mod error;
pub mod manager;

pub use apis::client::{KubeResourceClient, ResourceClient, WatchEvent, WatchStream};
pub use apis::gateway::ObjectStore;
pub use config::ControllerConfig;
pub use error::{ClientError, ControllerError};
pub use manager::Manager;
