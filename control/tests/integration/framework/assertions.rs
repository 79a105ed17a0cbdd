//! Condition assertions against the fake cluster

use super::fake_cluster::FakeCluster;
use super::{TestContext, TestResult};
use common::{ConditionStatus, CONDITION_ACCEPTED};

/// Current `Accepted` status and reason of a class, if it has one
pub fn accepted_status(cluster: &FakeCluster, name: &str) -> Option<(ConditionStatus, String)> {
    let class = cluster.class(name)?;
    let condition = class.condition(CONDITION_ACCEPTED)?;
    Some((condition.status, condition.reason.clone()))
}

/// Wait until `name` carries `Accepted=<status>` with `reason`
pub async fn wait_for_accepted(
    ctx: &TestContext,
    name: &str,
    status: ConditionStatus,
    reason: &str,
) -> TestResult {
    let cluster = ctx.cluster.clone();
    ctx.wait_for(&format!("{} Accepted={} ({})", name, status, reason), || {
        accepted_status(&cluster, name)
            .is_some_and(|(s, r)| s == status && r == reason)
    })
    .await
}

/// Fail if `name` has any `Accepted` condition
pub fn assert_no_status(ctx: &TestContext, name: &str) -> TestResult {
    match accepted_status(&ctx.cluster, name) {
        None => Ok(()),
        Some((status, reason)) => Err(format!(
            "{} should be untouched, found Accepted={} ({})",
            name, status, reason
        )
        .into()),
    }
}
