//! Election and promotion
//!
//! Two classes claim the same controller. The older one wins; deleting it
//! hands acceptance to the survivor.

use super::super::framework::assertions::{assert_no_status, wait_for_accepted};
use super::super::framework::fixtures::{at, foreign_gateway_class, gateway_class};
use super::super::framework::{TestContext, TestResult};
use super::super::TestScenario;
use common::{ConditionStatus, REASON_ACCEPTED, REASON_OLDER_GATEWAY_CLASS_EXISTS};

pub struct ElectionScenario;

#[async_trait::async_trait]
impl TestScenario for ElectionScenario {
    fn name(&self) -> &str {
        "election"
    }

    async fn run(&self, ctx: &mut TestContext) -> TestResult {
        // Created newest first so the winner arrives second.
        ctx.cluster.create_class(gateway_class("gc2", 10));
        ctx.cluster.create_class(gateway_class("gc1", 5));
        ctx.cluster.create_class(foreign_gateway_class("other", 1));

        wait_for_accepted(ctx, "gc1", ConditionStatus::True, REASON_ACCEPTED).await?;
        wait_for_accepted(
            ctx,
            "gc2",
            ConditionStatus::False,
            REASON_OLDER_GATEWAY_CLASS_EXISTS,
        )
        .await?;
        assert_no_status(ctx, "other")?;

        // Tombstone without finalizer, then the object goes away.
        ctx.cluster.mark_for_deletion("gc1", at(20));
        ctx.cluster.delete_class("gc1");

        wait_for_accepted(ctx, "gc2", ConditionStatus::True, REASON_ACCEPTED).await?;

        let store = ctx.store.clone();
        ctx.wait_for("gc1 evicted from cache", || !store.contains_class("gc1"))
            .await?;
        assert_no_status(ctx, "other")
    }
}
