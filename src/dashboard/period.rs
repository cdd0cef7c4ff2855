//! The date windows the dashboard can summarise.

use time::{Date, Duration};

/// A window of dates that starts at the beginning of the current week, month
/// or year and ends today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Week, Period::Month, Period::Year];

    /// Read the `period` query parameter. Anything unrecognised means a month.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("week") => Period::Week,
            Some("year") => Period::Year,
            _ => Period::Month,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Week => "Week",
            Period::Month => "Month",
            Period::Year => "Year",
        }
    }

    /// The heading shown above the period's statistics.
    pub fn title(self) -> &'static str {
        match self {
            Period::Week => "Statistics for the current week",
            Period::Month => "Statistics for the current month",
            Period::Year => "Statistics for the current year",
        }
    }

    /// The first day of the period containing `today`.
    ///
    /// Weeks start on Monday.
    pub fn start(self, today: Date) -> Date {
        let days_since_start = match self {
            Period::Week => i64::from(today.weekday().number_days_from_monday()),
            Period::Month => i64::from(today.day()) - 1,
            Period::Year => i64::from(today.ordinal()) - 1,
        };

        today - Duration::days(days_since_start)
    }
}
