//! Calendar types shared by the input layer and the sales engine.
//!
//! Dates are parsed once, here, so the engine only ever compares validated
//! values.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// A calendar month, the effective-date granularity of recurring and
/// one-off costs.
///
/// Deserializes from `"YYYY-MM"` or `"YYYY-MM-DD"` (the day is validated and
/// then dropped) and always serializes as `"YYYY-MM"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Build a year/month pair; `month` must be in `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::MalformedYearMonth(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Months since year 0, used for inclusive month arithmetic.
    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    /// Number of months in `[self, other]`, zero when `other` precedes `self`.
    pub fn months_through(&self, other: &YearMonth) -> u32 {
        let diff = other.ordinal() - self.ordinal() + 1;
        u32::try_from(diff.max(0)).unwrap_or(0)
    }

    /// First day of the month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Last day of the month.
    pub fn last_day(&self) -> Option<NaiveDate> {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1).and_then(|d| d.pred_opt())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedYearMonth(s.to_string());
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split('-').collect();
        match parts.as_slice() {
            [y, m] => {
                let year: i32 = y.parse().map_err(|_| malformed())?;
                let month: u32 = m.parse().map_err(|_| malformed())?;
                YearMonth::new(year, month).map_err(|_| malformed())
            }
            [_, _, _] => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(YearMonth::of)
                .map_err(|_| malformed()),
            _ => Err(malformed()),
        }
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Effective date of a one-off scenario cost, at the precision it was
/// recorded with. Entries dated on different days of one month stay
/// distinct.
///
/// Deserializes from `"YYYY-MM"` or `"YYYY-MM-DD"` and serializes back in
/// the same shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EffectiveDate {
    Month(YearMonth),
    Day(NaiveDate),
}

impl EffectiveDate {
    /// The month the cost falls in, used for period membership.
    pub fn month(&self) -> YearMonth {
        match self {
            EffectiveDate::Month(m) => *m,
            EffectiveDate::Day(d) => YearMonth::of(*d),
        }
    }
}

impl fmt::Display for EffectiveDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectiveDate::Month(m) => write!(f, "{m}"),
            EffectiveDate::Day(d) => write!(f, "{d}"),
        }
    }
}

impl FromStr for EffectiveDate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.split('-').count() == 3 {
            return NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(EffectiveDate::Day)
                .map_err(|_| ValidationError::MalformedYearMonth(s.to_string()));
        }
        trimmed.parse().map(EffectiveDate::Month)
    }
}

impl TryFrom<String> for EffectiveDate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EffectiveDate> for String {
    fn from(value: EffectiveDate) -> Self {
        value.to_string()
    }
}

/// Inclusive reporting window `[start, end]`.
///
/// Deserialization goes through [`ReportPeriod::new`], so a reversed window
/// is rejected at the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct ReportPeriod {
    /// First day included in the report.
    pub start: NaiveDate,
    /// Last day included in the report.
    pub end: NaiveDate,
}

impl ReportPeriod {
    /// Build a period, rejecting windows whose end precedes the start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::PeriodOrder { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start_month(&self) -> YearMonth {
        YearMonth::of(self.start)
    }

    pub fn end_month(&self) -> YearMonth {
        YearMonth::of(self.end)
    }

    /// Calendar months touched by the period, counted by year/month pair.
    ///
    /// `2024-01-31..=2024-02-01` spans two months even though it covers two
    /// days.
    pub fn months_spanned(&self) -> u32 {
        self.start_month().months_through(&self.end_month())
    }

    /// Whether `month` lies inside the period's year/month range.
    pub fn contains_month(&self, month: YearMonth) -> bool {
        self.start_month() <= month && month <= self.end_month()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Months shared by the period and an optional `[from, until]` window.
    /// Missing bounds are open.
    pub fn overlap_months(&self, from: Option<YearMonth>, until: Option<YearMonth>) -> u32 {
        let lo = match from {
            Some(f) => f.max(self.start_month()),
            None => self.start_month(),
        };
        let hi = match until {
            Some(u) => u.min(self.end_month()),
            None => self.end_month(),
        };
        lo.months_through(&hi)
    }

    /// Inclusive day count.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Deserialize)]
struct RawPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawPeriod> for ReportPeriod {
    type Error = ValidationError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        ReportPeriod::new(raw.start, raw.end)
    }
}

/// Named reporting windows offered by the dashboard filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodPreset {
    ThisMonth,
    LastMonth,
    ThisWeek,
    LastWeek,
    #[serde(rename = "last7days")]
    Last7Days,
    #[serde(rename = "last30days")]
    Last30Days,
    ThisYear,
    LastYear,
}

impl PeriodPreset {
    /// Resolve the preset against a reference day. Weeks start on Monday.
    pub fn resolve(self, today: NaiveDate) -> Result<ReportPeriod, ValidationError> {
        let bad = || ValidationError::PresetOutOfRange(today);
        let this_month = YearMonth::of(today);
        let month_range = |ym: YearMonth| -> Result<ReportPeriod, ValidationError> {
            let start = ym.first_day().ok_or_else(bad)?;
            let end = ym.last_day().ok_or_else(bad)?;
            ReportPeriod::new(start, end)
        };
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        match self {
            PeriodPreset::ThisMonth => month_range(this_month),
            PeriodPreset::LastMonth => {
                let prev = if this_month.month() == 1 {
                    YearMonth::new(this_month.year() - 1, 12)?
                } else {
                    YearMonth::new(this_month.year(), this_month.month() - 1)?
                };
                month_range(prev)
            }
            PeriodPreset::ThisWeek => ReportPeriod::new(monday, monday + Duration::days(6)),
            PeriodPreset::LastWeek => {
                ReportPeriod::new(monday - Duration::days(7), monday - Duration::days(1))
            }
            PeriodPreset::Last7Days => ReportPeriod::new(today - Duration::days(6), today),
            PeriodPreset::Last30Days => ReportPeriod::new(today - Duration::days(29), today),
            PeriodPreset::ThisYear => year_range(today.year()).ok_or_else(bad),
            PeriodPreset::LastYear => year_range(today.year() - 1).ok_or_else(bad),
        }
    }
}

fn year_range(year: i32) -> Option<ReportPeriod> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
    ReportPeriod::new(start, end).ok()
}

impl FromStr for PeriodPreset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thisMonth" => Ok(PeriodPreset::ThisMonth),
            "lastMonth" => Ok(PeriodPreset::LastMonth),
            "thisWeek" => Ok(PeriodPreset::ThisWeek),
            "lastWeek" => Ok(PeriodPreset::LastWeek),
            "last7days" => Ok(PeriodPreset::Last7Days),
            "last30days" => Ok(PeriodPreset::Last30Days),
            "thisYear" => Ok(PeriodPreset::ThisYear),
            "lastYear" => Ok(PeriodPreset::LastYear),
            other => Err(ValidationError::UnknownPreset(other.to_string())),
        }
    }
}
