//! Reusable objects

use chrono::{DateTime, TimeZone, Utc};
use common::{ClassObject, GatewayObject, GATEWAY_CLASS_FINALIZER};

pub const CONTROLLER: &str = "ctrl-a";
pub const OTHER_CONTROLLER: &str = "example.net/someone-else";

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

/// GatewayClass claiming our controller, created at `secs`
pub fn gateway_class(name: &str, secs: i64) -> ClassObject {
    ClassObject::new(name, CONTROLLER, at(secs))
}

/// Same, held by the gateways-exist finalizer
pub fn finalized_gateway_class(name: &str, secs: i64) -> ClassObject {
    let mut class = gateway_class(name, secs);
    class.finalizers.push(GATEWAY_CLASS_FINALIZER.to_string());
    class
}

pub fn foreign_gateway_class(name: &str, secs: i64) -> ClassObject {
    ClassObject::new(name, OTHER_CONTROLLER, at(secs))
}

pub fn gateway(namespace: &str, name: &str, class: &str) -> GatewayObject {
    GatewayObject::new(namespace, name, class)
}
