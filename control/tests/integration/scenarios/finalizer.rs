//! Deletion held by the gateways-exist finalizer
//!
//! While the finalizer is present the tombstoned class stays accepted. Once
//! it is removed the class is evicted and the next-oldest promoted, even
//! before the object itself disappears.

use super::super::framework::assertions::wait_for_accepted;
use super::super::framework::fixtures::{at, finalized_gateway_class, gateway_class};
use super::super::framework::{TestContext, TestResult};
use super::super::TestScenario;
use common::{ConditionStatus, REASON_ACCEPTED, REASON_OLDER_GATEWAY_CLASS_EXISTS};

pub struct FinalizerScenario;

#[async_trait::async_trait]
impl TestScenario for FinalizerScenario {
    fn name(&self) -> &str {
        "finalizer"
    }

    async fn run(&self, ctx: &mut TestContext) -> TestResult {
        ctx.cluster.create_class(finalized_gateway_class("held", 1));
        ctx.cluster.create_class(gateway_class("next", 2));

        wait_for_accepted(ctx, "held", ConditionStatus::True, REASON_ACCEPTED).await?;
        wait_for_accepted(
            ctx,
            "next",
            ConditionStatus::False,
            REASON_OLDER_GATEWAY_CLASS_EXISTS,
        )
        .await?;

        ctx.cluster.mark_for_deletion("held", at(30));
        ctx.settle().await;
        if !ctx.store.contains_class("held") {
            return Err("finalizer should keep the tombstoned class cached".into());
        }
        wait_for_accepted(
            ctx,
            "next",
            ConditionStatus::False,
            REASON_OLDER_GATEWAY_CLASS_EXISTS,
        )
        .await?;

        ctx.cluster.remove_finalizer("held");

        wait_for_accepted(ctx, "next", ConditionStatus::True, REASON_ACCEPTED).await?;
        let store = ctx.store.clone();
        ctx.wait_for("held evicted", || !store.contains_class("held"))
            .await
    }
}
