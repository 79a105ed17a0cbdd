//! GatewayClass election
//!
//! Several GatewayClasses may name the same controller. Exactly one of them
//! is accepted: the oldest by creation timestamp, ties broken by name. The
//! order is total, so two distinct classes never compare equal.

use crate::object::ClassObject;
use std::cmp::Ordering;

/// Total order over GatewayClasses. The minimum is the accepted class.
///
/// A class without a creation timestamp sorts after every stamped class.
pub fn election_order(a: &ClassObject, b: &ClassObject) -> Ordering {
    let by_time = match (a.creation_timestamp, b.creation_timestamp) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_time.then_with(|| a.name.cmp(&b.name))
}

/// `a` outranks `b`
#[inline]
pub fn is_older(a: &ClassObject, b: &ClassObject) -> bool {
    election_order(a, b) == Ordering::Less
}

/// Pick the accepted class among the candidates
pub fn elect<'a, I>(candidates: I) -> Option<&'a ClassObject>
where
    I: IntoIterator<Item = &'a ClassObject>,
{
    candidates
        .into_iter()
        .min_by(|a, b| election_order(a, b))
}
