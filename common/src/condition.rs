//! Status conditions
//!
//! Mirrors the `metav1.Condition` shape used by Gateway API status blocks.
//! Serialized camelCase so a condition list can be dropped straight into a
//! merge patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition type published on every managed GatewayClass
pub const CONDITION_ACCEPTED: &str = "Accepted";

/// Reason for `Accepted=True`
pub const REASON_ACCEPTED: &str = "Accepted";

/// Reason for `Accepted=False` on a displaced duplicate
pub const REASON_OLDER_GATEWAY_CLASS_EXISTS: &str = "OlderGatewayClassExists";

/// Tri-state condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }

    /// Parse the API string form. Anything unrecognised is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed status entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    #[serde(default)]
    pub observed_generation: i64,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Equality that ignores `last_transition_time`.
    ///
    /// Timestamp churn alone must never look like a status change.
    pub fn same_as(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
            && self.observed_generation == other.observed_generation
    }
}

/// Find the condition of the given type
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Write a condition: drop every entry of the same type, then append.
///
/// The relative order of the remaining conditions is preserved.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    conditions.retain(|c| c.type_ != condition.type_);
    conditions.push(condition);
}

/// Compare two condition lists element-wise, ignoring transition times
pub fn conditions_equivalent(a: &[Condition], b: &[Condition]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn condition(type_: &str, status: ConditionStatus, secs: i64) -> Condition {
        Condition {
            type_: type_.to_string(),
            status,
            reason: "Reason".to_string(),
            message: "message".to_string(),
            observed_generation: 1,
            last_transition_time: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_same_as_ignores_transition_time() {
        let a = condition("Accepted", ConditionStatus::True, 10);
        let b = condition("Accepted", ConditionStatus::True, 99);
        assert!(a.same_as(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_as_detects_generation_change() {
        let a = condition("Accepted", ConditionStatus::True, 10);
        let mut b = a.clone();
        b.observed_generation = 2;
        assert!(!a.same_as(&b));
    }

    #[test]
    fn test_set_condition_replaces_same_type_and_appends() {
        let mut conditions = vec![
            condition("Accepted", ConditionStatus::False, 1),
            condition("Programmed", ConditionStatus::True, 1),
            condition("Ready", ConditionStatus::True, 1),
        ];

        set_condition(&mut conditions, condition("Accepted", ConditionStatus::True, 2));

        let types: Vec<_> = conditions.iter().map(|c| c.type_.as_str()).collect();
        assert_eq!(types, vec!["Programmed", "Ready", "Accepted"]);
        assert_eq!(conditions[2].status, ConditionStatus::True);
    }

    #[test]
    fn test_set_condition_on_empty_list() {
        let mut conditions = Vec::new();
        set_condition(&mut conditions, condition("Accepted", ConditionStatus::True, 1));
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn test_status_parse_is_total() {
        assert_eq!(ConditionStatus::parse("True"), ConditionStatus::True);
        assert_eq!(ConditionStatus::parse("False"), ConditionStatus::False);
        assert_eq!(ConditionStatus::parse("Unknown"), ConditionStatus::Unknown);
        assert_eq!(ConditionStatus::parse("maybe"), ConditionStatus::Unknown);
    }

    #[test]
    fn test_condition_serializes_camel_case() {
        let value = serde_json::to_value(condition("Accepted", ConditionStatus::True, 0)).unwrap();
        assert_eq!(value["type"], "Accepted");
        assert_eq!(value["status"], "True");
        assert_eq!(value["observedGeneration"], 1);
        assert_eq!(value["lastTransitionTime"], "1970-01-01T00:00:00Z");
    }
}
