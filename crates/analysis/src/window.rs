use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("year {0} is outside the supported calendar range")]
    UnsupportedYear(i32),
}

/// Inclusive UTC bounds `[Jan 1 00:00:00, Dec 31 23:59:59]` of one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearWindow {
    year: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl YearWindow {
    pub fn for_year(year: i32) -> Result<Self, WindowError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or(WindowError::UnsupportedYear(year))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .and_then(|date| date.and_hms_opt(23, 59, 59))
            .ok_or(WindowError::UnsupportedYear(year))?;
        Ok(Self {
            year,
            start: Utc.from_utc_datetime(&start),
            end: Utc.from_utc_datetime(&end),
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    /// Week-start timestamps from the stats endpoints are epoch seconds.
    pub fn contains_epoch(&self, epoch_secs: i64) -> bool {
        epoch_secs >= self.start.timestamp() && epoch_secs <= self.end.timestamp()
    }
}

pub(crate) fn epoch_to_datetime(epoch_secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(epoch_secs, 0)
}

/// Month index (0 = January) of an epoch timestamp in UTC.
pub(crate) fn epoch_month(epoch_secs: i64) -> Option<usize> {
    epoch_to_datetime(epoch_secs).map(|dt| dt.month0() as usize)
}
