//! Gateways follow their class's controller
//!
//! Gateways naming one of our classes are cached, others are not, and
//! deletions evict.

use super::super::framework::fixtures::{foreign_gateway_class, gateway, gateway_class};
use super::super::framework::{TestContext, TestResult};
use super::super::TestScenario;
use common::GatewayKey;

pub struct GatewayTrackingScenario;

#[async_trait::async_trait]
impl TestScenario for GatewayTrackingScenario {
    fn name(&self) -> &str {
        "gateway_tracking"
    }

    async fn run(&self, ctx: &mut TestContext) -> TestResult {
        ctx.cluster.create_class(gateway_class("ours", 1));
        ctx.cluster.create_class(foreign_gateway_class("theirs", 1));

        let store = ctx.store.clone();
        ctx.wait_for("ours cached", || store.contains_class("ours"))
            .await?;

        ctx.cluster.apply_gateway(gateway("team-a", "edge", "ours"));
        ctx.cluster.apply_gateway(gateway("team-b", "edge", "theirs"));
        ctx.cluster.apply_gateway(gateway("team-c", "edge", "missing"));

        let ours = GatewayKey::new("team-a", "edge");
        ctx.wait_for("team-a/edge cached", || store.contains_gateway(&ours))
            .await?;
        ctx.settle().await;
        if store.gateway_count() != 1 {
            return Err(format!(
                "only team-a/edge should be cached, found {:?}",
                store.gateway_keys()
            )
            .into());
        }

        ctx.cluster.delete_gateway(&ours);
        ctx.wait_for("team-a/edge evicted", || !store.contains_gateway(&ours))
            .await
    }
}
