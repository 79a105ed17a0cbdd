//! GatewayClass status policy
//!
//! Pure functions: given a class and its election outcome, compute the
//! condition list it should carry and the merge patch that writes it.

use chrono::{DateTime, SubsecRound, Utc};
use common::{
    set_condition, ClassObject, Condition, ConditionStatus, CONDITION_ACCEPTED, REASON_ACCEPTED,
    REASON_OLDER_GATEWAY_CLASS_EXISTS,
};
use serde_json::json;

pub const MESSAGE_ACCEPTED: &str = "gatewayclass is accepted";
pub const MESSAGE_OLDER_GATEWAY_CLASS_EXISTS: &str =
    "An older GatewayClass with the same controller exists";

/// Election outcome for one class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// This class won the election
    Accepted,
    /// An older class with the same controller name won
    Displaced,
}

impl Acceptance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Acceptance::Accepted => "accepted",
            Acceptance::Displaced => "displaced",
        }
    }
}

/// The `Accepted` condition for `class` under `acceptance`.
///
/// If the class already carries an `Accepted` condition with the same status,
/// its transition time is kept. Otherwise the transition happens at `now`,
/// truncated to whole seconds as the API server stores it.
pub fn accepted_condition(
    class: &ClassObject,
    acceptance: Acceptance,
    now: DateTime<Utc>,
) -> Condition {
    let (status, reason, message) = match acceptance {
        Acceptance::Accepted => (ConditionStatus::True, REASON_ACCEPTED, MESSAGE_ACCEPTED),
        Acceptance::Displaced => (
            ConditionStatus::False,
            REASON_OLDER_GATEWAY_CLASS_EXISTS,
            MESSAGE_OLDER_GATEWAY_CLASS_EXISTS,
        ),
    };

    let last_transition_time = match class.condition(CONDITION_ACCEPTED) {
        Some(existing) if existing.status == status => existing.last_transition_time,
        _ => now.trunc_subsecs(0),
    };

    Condition {
        type_: CONDITION_ACCEPTED.to_string(),
        status,
        reason: reason.to_string(),
        message: message.to_string(),
        observed_generation: class.generation,
        last_transition_time,
    }
}

/// The full condition list `class` should carry, or `None` if what it has is
/// already equivalent (transition times ignored)
pub fn desired_conditions(
    class: &ClassObject,
    acceptance: Acceptance,
    now: DateTime<Utc>,
) -> Option<Vec<Condition>> {
    let desired = accepted_condition(class, acceptance, now);
    if class
        .condition(CONDITION_ACCEPTED)
        .is_some_and(|current| current.same_as(&desired))
    {
        return None;
    }

    let mut conditions = class.conditions.clone();
    set_condition(&mut conditions, desired);
    Some(conditions)
}

/// Merge patch writing `conditions` to the status subresource.
///
/// A merge patch replaces lists wholesale, so the complete list derived from
/// the last-read snapshot is sent. Other status fields are left untouched.
pub fn status_patch(conditions: &[Condition]) -> serde_json::Value {
    json!({
        "status": {
            "conditions": conditions,
        }
    })
}
