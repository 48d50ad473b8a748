use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::errors::SubscriptionError;

/// Recurring unit of a billing cycle.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let interval = match self {
            Interval::Day => "day",
            Interval::Week => "week",
            Interval::Month => "month",
            Interval::Year => "year",
        };
        write!(f, "{}", interval)
    }
}

impl Interval {
    pub fn all() -> [Interval; 4] {
        [Interval::Day, Interval::Week, Interval::Month, Interval::Year]
    }

    /// Display label for the interval.
    pub fn name(&self) -> &'static str {
        match self {
            Interval::Day => "Day",
            Interval::Week => "Week",
            Interval::Month => "Month",
            Interval::Year => "Year",
        }
    }
}

impl TryFrom<&str> for Interval {
    type Error = SubscriptionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "day" => Ok(Interval::Day),
            "week" => Ok(Interval::Week),
            "month" => Ok(Interval::Month),
            "year" => Ok(Interval::Year),
            other => Err(SubscriptionError::InvalidInterval(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tokens() {
        for interval in Interval::all() {
            let token = interval.to_string();
            assert_eq!(Interval::try_from(token.as_str()).unwrap(), interval);
        }
    }

    #[test]
    fn rejects_unknown_token() {
        let err = Interval::try_from("fortnight").unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidInterval(ref token) if token == "fortnight"));
        assert_eq!(err.to_string(), "invalid interval \"fortnight\"");
    }

    #[test]
    fn tokens_are_case_sensitive() {
        assert!(Interval::try_from("Month").is_err());
    }
}
