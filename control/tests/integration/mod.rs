//! Gatewarden Scenario Test Framework
//!
//! Drives the whole pipeline (watch adapters, funnel, processor) against an
//! in-process cluster.
//!
//! ## Architecture
//!
//! - **framework/**: fake cluster, test context, fixtures, assertions
//! - **scenarios/**: one end-to-end story each
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test integration_test
//! ```

#![allow(dead_code, clippy::expect_used, clippy::panic, clippy::unwrap_used)]

pub mod framework;
pub mod scenarios;

pub use framework::{TestContext, TestResult};

/// Test scenario trait
///
/// Each scenario gets its own cluster and controller.
#[async_trait::async_trait]
pub trait TestScenario: Send + Sync {
    /// Scenario name (for logging)
    fn name(&self) -> &str;

    /// Run the test scenario
    async fn run(&self, ctx: &mut TestContext) -> TestResult;
}
