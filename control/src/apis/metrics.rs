//! Controller metrics
//!
//! One registry for the whole control plane, scraped through the admin
//! endpoint.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    /// Controller metrics registry
    pub static ref CONTROLLER_METRICS_REGISTRY: Registry = Registry::new();

    /// GatewayClass reconciliation duration
    static ref GATEWAYCLASS_RECONCILIATION_DURATION: HistogramVec = {
        let opts = HistogramOpts::new(
            "gatewayclass_reconciliation_duration_seconds",
            "GatewayClass reconciliation duration in seconds",
        );
        let histogram = HistogramVec::new(opts, &["gatewayclass"])
            .expect("Failed to create histogram");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(histogram.clone()))
            .expect("Failed to register histogram");
        histogram
    };

    /// GatewayClass reconciliations total
    static ref GATEWAYCLASS_RECONCILIATIONS_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "gatewayclass_reconciliations_total",
            "Total number of gatewayclass reconciliations",
        );
        let counter = IntCounterVec::new(opts, &["gatewayclass", "result"])
            .expect("Failed to create counter");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Gateway reconciliation duration
    static ref GATEWAY_RECONCILIATION_DURATION: HistogramVec = {
        let opts = HistogramOpts::new(
            "gateway_reconciliation_duration_seconds",
            "Gateway reconciliation duration in seconds",
        );
        let histogram = HistogramVec::new(opts, &["gateway", "namespace"])
            .expect("Failed to create histogram");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(histogram.clone()))
            .expect("Failed to register histogram");
        histogram
    };

    /// Gateway reconciliations total
    static ref GATEWAY_RECONCILIATIONS_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "gateway_reconciliations_total",
            "Total number of gateway reconciliations",
        );
        let counter = IntCounterVec::new(opts, &["gateway", "namespace", "result"])
            .expect("Failed to create counter");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Status patches issued
    static ref STATUS_PATCHES_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "status_patches_total",
            "Total number of status patches by kind and result",
        );
        let counter = IntCounterVec::new(opts, &["kind", "result"])
            .expect("Failed to create counter");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Events pushed through the funnel
    static ref FUNNEL_EVENTS_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "funnel_events_total",
            "Total number of events sent to the processor",
        );
        let counter = IntCounterVec::new(opts, &["kind", "change"])
            .expect("Failed to create counter");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Watch notifications by outcome (ignored, unchanged, enqueued)
    static ref WATCH_NOTIFICATIONS_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "watch_notifications_total",
            "Total number of watch notifications by kind and outcome",
        );
        let counter = IntCounterVec::new(opts, &["kind", "outcome"])
            .expect("Failed to create counter");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Objects currently held in the cache
    static ref MANAGED_OBJECTS: IntGaugeVec = {
        let opts = Opts::new(
            "managed_objects",
            "Number of managed objects in the cache by kind",
        );
        let gauge = IntGaugeVec::new(opts, &["kind"])
            .expect("Failed to create gauge");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(gauge.clone()))
            .expect("Failed to register gauge");
        gauge
    };
}

/// Record GatewayClass reconciliation
pub fn record_gatewayclass_reconciliation(gatewayclass: &str, duration_secs: f64, result: &str) {
    GATEWAYCLASS_RECONCILIATION_DURATION
        .with_label_values(&[gatewayclass])
        .observe(duration_secs);

    GATEWAYCLASS_RECONCILIATIONS_TOTAL
        .with_label_values(&[gatewayclass, result])
        .inc();
}

/// Record Gateway reconciliation
pub fn record_gateway_reconciliation(
    gateway: &str,
    namespace: &str,
    duration_secs: f64,
    result: &str,
) {
    GATEWAY_RECONCILIATION_DURATION
        .with_label_values(&[gateway, namespace])
        .observe(duration_secs);

    GATEWAY_RECONCILIATIONS_TOTAL
        .with_label_values(&[gateway, namespace, result])
        .inc();
}

pub fn record_status_patch(kind: &str, result: &str) {
    STATUS_PATCHES_TOTAL.with_label_values(&[kind, result]).inc();
}

pub fn record_funnel_event(kind: &str, change: &str) {
    FUNNEL_EVENTS_TOTAL.with_label_values(&[kind, change]).inc();
}

pub fn record_watch_notification(kind: &str, outcome: &str) {
    WATCH_NOTIFICATIONS_TOTAL
        .with_label_values(&[kind, outcome])
        .inc();
}

pub fn set_managed_objects(kind: &str, count: usize) {
    MANAGED_OBJECTS
        .with_label_values(&[kind])
        .set(count as i64);
}

/// Gather controller metrics in Prometheus text format
pub fn gather_controller_metrics() -> Result<String, String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = CONTROLLER_METRICS_REGISTRY.gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Failed to convert to UTF-8: {}", e))
}
