//! Configuration for the Gatewarden controller
//!
//! Everything comes from environment variables; there is no config file.

use crate::error::ControllerError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Controller configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Controller name claimed in `GatewayClass.spec.controllerName`
    #[serde(default = "default_controller_name")]
    pub controller_name: String,

    /// Event funnel buffer size (producers block when full)
    #[serde(default = "default_funnel_capacity")]
    pub funnel_capacity: usize,

    /// Admin endpoint (/healthz, /readyz, /metrics)
    #[serde(default = "default_admin_bind_addr")]
    pub admin_bind_addr: String,

    /// Upper bound for a single API call in seconds (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long shutdown waits for tasks to drain in seconds (default: 10s)
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// Status patch retry policy
    #[serde(default)]
    pub status_retry: RetryConfig,
}

/// Bounded exponential backoff for status writes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts including the first one (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff in milliseconds (default: 100ms)
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds (default: 5s)
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_controller_name() -> String {
    "gatewarden.io/gateway-manager".to_string()
}

fn default_funnel_capacity() -> usize {
    1024
}

fn default_admin_bind_addr() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_grace() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff() -> u64 {
    100
}

fn default_max_backoff() -> u64 {
    5_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (1-based), capped at the ceiling
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let millis = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller_name: default_controller_name(),
            funnel_capacity: default_funnel_capacity(),
            admin_bind_addr: default_admin_bind_addr(),
            request_timeout_secs: default_request_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
            status_retry: RetryConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from `GATEWARDEN_*` environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        let mut config = Self::default();

        if let Ok(val) = env::var("GATEWARDEN_CONTROLLER_NAME") {
            config.controller_name = val;
        }
        if let Some(val) = parse_env("GATEWARDEN_FUNNEL_CAPACITY")? {
            config.funnel_capacity = val;
        }
        if let Ok(val) = env::var("GATEWARDEN_ADMIN_BIND_ADDR") {
            config.admin_bind_addr = val;
        }
        if let Some(val) = parse_env("GATEWARDEN_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout_secs = val;
        }
        if let Some(val) = parse_env("GATEWARDEN_SHUTDOWN_GRACE_SECS")? {
            config.shutdown_grace_secs = val;
        }
        if let Some(val) = parse_env("GATEWARDEN_STATUS_MAX_ATTEMPTS")? {
            config.status_retry.max_attempts = val;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.controller_name.trim().is_empty() {
            return Err(ControllerError::Config(
                "controller name must not be empty".to_string(),
            ));
        }
        if self.funnel_capacity == 0 {
            return Err(ControllerError::Config(
                "funnel capacity must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ControllerError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.status_retry.max_attempts == 0 {
            return Err(ControllerError::Config(
                "status retry needs at least one attempt".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ControllerError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ControllerError::Config(format!("invalid {}={:?}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
