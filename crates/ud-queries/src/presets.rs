//! Rule sets behind the statistics page

use chrono::{DateTime, Duration, Utc};

use crate::catalog::fields;
use crate::filters::{FilterRule, RuleSet};

/// Every user
pub fn all_users() -> RuleSet {
    RuleSet::new()
}

/// Users who joined after a unix timestamp
pub fn joined_since(unix: i64) -> RuleSet {
    RuleSet::from_trusted(vec![FilterRule::gt(fields::JOIN_DATE, unix)])
}

/// Longest join window offered for statistics, in days
pub const MAX_JOIN_WINDOW_DAYS: i64 = 365 * 100;

/// Users who joined within the last `days` days.
///
/// `None` when `days` is negative or the window start is out of range.
pub fn joined_within_days(days: i64, now: DateTime<Utc>) -> Option<RuleSet> {
    if days < 0 {
        return None;
    }
    let start = now.checked_sub_signed(Duration::try_days(days)?)?;
    Some(joined_since(start.timestamp()))
}

/// Users from one country
pub fn country_is(country: impl Into<String>) -> RuleSet {
    RuleSet::from_trusted(vec![FilterRule::equals(fields::COUNTRY, country.into())])
}

/// Users whose country is not set
pub fn country_unknown() -> RuleSet {
    RuleSet::from_trusted(vec![FilterRule::is_empty(fields::COUNTRY)])
}
