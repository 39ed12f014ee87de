//! Delta monotonicity check
//!
//! Position 1 carries an absolute race time; every later position carries a
//! delta to the leader, which must strictly increase down the order.

use std::collections::BTreeSet;
use tracing::warn;

use super::time_token::parse_time;
use crate::models::DriverResult;

/// Positions whose delta does not exceed the previous parsable delta.
///
/// **Algorithm:**
/// 1. Sort by position, skip position 1
/// 2. Skip positions without a parsable race time (DNF, lap deficit)
/// 3. Flag a position if its value is `<=` the previous parsable value;
///    the baseline advances to the current value either way
pub fn validate_deltas<'a, I>(drivers: I) -> BTreeSet<u32>
where
    I: IntoIterator<Item = &'a DriverResult>,
{
    let mut sorted: Vec<&DriverResult> = drivers.into_iter().collect();
    sorted.sort_by_key(|d| d.position);

    let mut violations = BTreeSet::new();
    let mut previous: Option<u64> = None;

    for d in sorted {
        if d.position == 1 {
            continue;
        }
        let Some(value) = parse_time(&d.time).race_time else {
            continue;
        };
        if let Some(prev) = previous {
            if value <= prev {
                warn!(position = d.position, value, previous = prev, "Delta not increasing");
                violations.insert(d.position);
            }
        }
        previous = Some(value);
    }

    violations
}
