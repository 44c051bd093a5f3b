//! Calendar helpers for frame timestamps (epoch milliseconds, UTC)

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds in a 365-day year, the unit of the `time` covariate
pub const MS_PER_YEAR: f64 = 1000.0 * 60.0 * 60.0 * 24.0 * 365.0;

/// Calendar field used to bucket frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarUnit {
    /// Month of the year, 1..=12
    Month,
    /// Calendar year
    Year,
}

impl CalendarUnit {
    /// Property name used to tag frames reduced over this unit
    pub fn name(&self) -> &'static str {
        match self {
            CalendarUnit::Month => "month",
            CalendarUnit::Year => "year",
        }
    }

    /// Value of this field for a timestamp
    pub fn of(&self, timestamp_ms: i64) -> Result<i32> {
        let dt = datetime_from_millis(timestamp_ms)?;
        Ok(match self {
            CalendarUnit::Month => dt.month() as i32,
            CalendarUnit::Year => dt.year(),
        })
    }
}

/// Convert epoch milliseconds to a UTC datetime
pub fn datetime_from_millis(timestamp_ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(timestamp_ms).ok_or(Error::InvalidTimestamp(timestamp_ms))
}

/// Fractional years since the epoch
pub fn years_since_epoch(timestamp_ms: i64) -> f64 {
    timestamp_ms as f64 / MS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_month_and_year() {
        let ts = Utc.with_ymd_and_hms(2021, 3, 31, 23, 59, 59).unwrap().timestamp_millis();
        assert_eq!(CalendarUnit::Month.of(ts).unwrap(), 3);
        assert_eq!(CalendarUnit::Year.of(ts).unwrap(), 2021);
    }

    #[test]
    fn test_years_since_epoch() {
        assert_eq!(years_since_epoch(0), 0.0);
        assert!((years_since_epoch(MS_PER_YEAR as i64) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert!(matches!(
            datetime_from_millis(i64::MAX),
            Err(Error::InvalidTimestamp(_))
        ));
    }
}
