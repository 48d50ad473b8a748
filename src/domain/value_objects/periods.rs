use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{errors::SubscriptionError, value_objects::enums::intervals::Interval};

/// Concrete `[starts_at, ends_at)` range of one billing cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Computes the billing period of `interval_count` intervals starting at `start`.
///
/// Month and year intervals advance by calendar months; when the target month is
/// shorter than the start day, the end clamps to the last day of that month
/// (2024-01-31 + 1 month = 2024-02-29).
pub fn compute_period(
    interval: Interval,
    interval_count: i64,
    start: DateTime<Utc>,
) -> Result<Period, SubscriptionError> {
    let count = u32::try_from(interval_count)
        .ok()
        .filter(|count| *count >= 1)
        .ok_or(SubscriptionError::InvalidIntervalCount(interval_count))?;

    let ends_at = match interval {
        Interval::Day => start.checked_add_days(Days::new(count.into())),
        Interval::Week => start.checked_add_days(Days::new(u64::from(count) * 7)),
        Interval::Month => start.checked_add_months(Months::new(count)),
        Interval::Year => count
            .checked_mul(12)
            .and_then(|months| start.checked_add_months(Months::new(months))),
    }
    .ok_or(SubscriptionError::InvalidIntervalCount(interval_count))?;

    Ok(Period {
        starts_at: start,
        ends_at,
    })
}

/// Token-level entry point: validates the interval token first.
pub fn compute_period_from_token(
    interval: &str,
    interval_count: i64,
    start: DateTime<Utc>,
) -> Result<Period, SubscriptionError> {
    compute_period(Interval::try_from(interval)?, interval_count, start)
}
