//! Calendar-aware time arithmetic
//!
//! This module provides the period grain used for sample regularity and
//! aggregation bucketing, plus boundary arithmetic over instants: finding the
//! period-aligned boundary containing an instant and stepping instants by whole
//! periods. Month-class periods use calendar arithmetic rather than fixed
//! durations. Pure, no I/O, no ambient clock.

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, Offset,
    Timelike, Utc, Weekday,
};
use serde::{Deserialize, Serialize};

/// The calendar period between expected samples, when known.
///
/// Also the bucket size for period aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    /// Step an instant backward by one period.
    ///
    /// Always strictly moves the instant for representable dates; at the edges
    /// of the representable range it saturates rather than standing still, so
    /// padding loops terminate.
    pub fn step_back(&self, t: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            Period::Hour => t.checked_sub_signed(Duration::hours(1)),
            Period::Day => t.checked_sub_signed(Duration::days(1)),
            Period::Week => t.checked_sub_signed(Duration::weeks(1)),
            Period::Month => t.checked_sub_months(Months::new(1)),
            Period::Quarter => t.checked_sub_months(Months::new(3)),
            Period::Year => t.checked_sub_months(Months::new(12)),
        }
        .unwrap_or_else(far_past)
    }

    /// Step an instant forward by one period.
    pub fn step_forward(&self, t: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            Period::Hour => t.checked_add_signed(Duration::hours(1)),
            Period::Day => t.checked_add_signed(Duration::days(1)),
            Period::Week => t.checked_add_signed(Duration::weeks(1)),
            Period::Month => t.checked_add_months(Months::new(1)),
            Period::Quarter => t.checked_add_months(Months::new(3)),
            Period::Year => t.checked_add_months(Months::new(12)),
        }
        .unwrap_or_else(far_future)
    }
}

/// Saturation point for backward stepping.
pub(crate) fn far_past() -> DateTime<FixedOffset> {
    DateTime::<Utc>::MIN_UTC.fixed_offset()
}

/// Saturation point for forward stepping.
pub(crate) fn far_future() -> DateTime<FixedOffset> {
    DateTime::<Utc>::MAX_UTC.fixed_offset()
}

/// Boundary arithmetic in a fixed aggregation offset.
///
/// Week boundaries honor the user's first day of week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeHelper {
    offset: FixedOffset,
    first_day_of_week: Weekday,
}

impl Default for TimeHelper {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeHelper {
    pub fn new(offset: FixedOffset, first_day_of_week: Weekday) -> Self {
        Self {
            offset,
            first_day_of_week,
        }
    }

    /// Helper aligned to UTC with weeks starting on Monday.
    pub fn utc() -> Self {
        Self {
            offset: chrono::Utc.fix(),
            first_day_of_week: Weekday::Mon,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Latest period-aligned boundary at or before `t`, in the helper's offset.
    pub fn find_beginning_of_period(
        &self,
        t: DateTime<FixedOffset>,
        period: Period,
    ) -> DateTime<FixedOffset> {
        let local = t.with_timezone(&self.offset);
        let date = local.date_naive();
        let start = match period {
            Period::Hour => date.and_hms_opt(local.hour(), 0, 0),
            Period::Day => date.and_hms_opt(0, 0, 0),
            Period::Week => {
                let days_back = date.weekday().days_since(self.first_day_of_week);
                date.checked_sub_days(Days::new(u64::from(days_back)))
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }
            Period::Month => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
            Period::Quarter => {
                let quarter_month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), quarter_month, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }
            Period::Year => {
                NaiveDate::from_ymd_opt(date.year(), 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
            }
        };
        match start {
            Some(naive) => self.at_local(naive),
            // unreachable for dates chrono can represent
            None => local,
        }
    }

    /// Exclusive end of the period containing `t`.
    ///
    /// For an instant exactly on a boundary this is one whole period later, so
    /// the boundary itself is covered by the span it begins.
    pub fn find_end_of_period(
        &self,
        t: DateTime<FixedOffset>,
        period: Period,
    ) -> DateTime<FixedOffset> {
        period.step_forward(self.find_beginning_of_period(t, period))
    }

    fn at_local(&self, naive: NaiveDateTime) -> DateTime<FixedOffset> {
        let utc = naive - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, self.offset)
    }
}
