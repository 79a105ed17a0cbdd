//! Deletion missed while the watch was down
//!
//! The accepted class disappears without a notification. The next re-list
//! does not replay it, so it is evicted and the survivor promoted.

use super::super::framework::assertions::wait_for_accepted;
use super::super::framework::fixtures::gateway_class;
use super::super::framework::{TestContext, TestResult};
use super::super::TestScenario;
use common::{ConditionStatus, REASON_ACCEPTED, REASON_OLDER_GATEWAY_CLASS_EXISTS};

pub struct RelistScenario;

#[async_trait::async_trait]
impl TestScenario for RelistScenario {
    fn name(&self) -> &str {
        "relist"
    }

    async fn run(&self, ctx: &mut TestContext) -> TestResult {
        ctx.cluster.create_class(gateway_class("vanishing", 1));
        ctx.cluster.create_class(gateway_class("survivor", 2));

        wait_for_accepted(ctx, "vanishing", ConditionStatus::True, REASON_ACCEPTED).await?;
        wait_for_accepted(
            ctx,
            "survivor",
            ConditionStatus::False,
            REASON_OLDER_GATEWAY_CLASS_EXISTS,
        )
        .await?;

        ctx.cluster.delete_class_unobserved("vanishing");
        ctx.settle().await;
        if !ctx.store.contains_class("vanishing") {
            return Err("nothing should have noticed the deletion yet".into());
        }

        ctx.cluster.relist_classes();

        wait_for_accepted(ctx, "survivor", ConditionStatus::True, REASON_ACCEPTED).await?;
        let store = ctx.store.clone();
        ctx.wait_for("vanishing evicted", || !store.contains_class("vanishing"))
            .await
    }
}
