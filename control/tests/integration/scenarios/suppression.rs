//! No-op notifications
//!
//! Once status has converged, re-delivering unchanged objects must not
//! produce a single extra patch.

use super::super::framework::assertions::wait_for_accepted;
use super::super::framework::fixtures::gateway_class;
use super::super::framework::{TestContext, TestResult};
use super::super::TestScenario;
use common::{ConditionStatus, REASON_ACCEPTED, REASON_OLDER_GATEWAY_CLASS_EXISTS};

pub struct SuppressionScenario;

#[async_trait::async_trait]
impl TestScenario for SuppressionScenario {
    fn name(&self) -> &str {
        "suppression"
    }

    async fn run(&self, ctx: &mut TestContext) -> TestResult {
        ctx.cluster.create_class(gateway_class("first", 1));
        ctx.cluster.create_class(gateway_class("second", 2));

        wait_for_accepted(ctx, "first", ConditionStatus::True, REASON_ACCEPTED).await?;
        wait_for_accepted(
            ctx,
            "second",
            ConditionStatus::False,
            REASON_OLDER_GATEWAY_CLASS_EXISTS,
        )
        .await?;
        ctx.settle().await;

        let patches = ctx.cluster.patch_count();
        let writes = ctx.store.metrics().class_writes();

        for _ in 0..5 {
            ctx.cluster.touch_class("first");
            ctx.cluster.touch_class("second");
        }
        ctx.cluster.relist_classes();
        ctx.settle().await;

        if ctx.cluster.patch_count() != patches {
            return Err(format!(
                "expected {} patches, got {}",
                patches,
                ctx.cluster.patch_count()
            )
            .into());
        }
        if ctx.store.metrics().class_writes() != writes {
            return Err("unchanged notifications were written to the cache".into());
        }
        Ok(())
    }
}
