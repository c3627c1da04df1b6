//! Date-range presets for fetching and filtering events.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// The date selector shown above the table. Each value is also the key the
/// reconciled record list is cached under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateFilter {
    #[default]
    All,
    Last7Days,
    Last30Days,
    Last90Days,
    CurrentWeek,
    CurrentMonth,
    NextWeek,
    Custom {
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl DateFilter {
    /// Presets in the order the selector lists them (custom range last).
    pub const PRESETS: [DateFilter; 7] = [
        DateFilter::All,
        DateFilter::Last7Days,
        DateFilter::Last30Days,
        DateFilter::Last90Days,
        DateFilter::CurrentWeek,
        DateFilter::CurrentMonth,
        DateFilter::NextWeek,
    ];

    /// A custom range; the bounds are put in order if given reversed.
    pub fn custom(a: NaiveDate, b: NaiveDate) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        DateFilter::Custom { start, end }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateFilter::All => "Default",
            DateFilter::Last7Days => "Last 7 Days",
            DateFilter::Last30Days => "Last 30 Days",
            DateFilter::Last90Days => "Last 90 Days",
            DateFilter::CurrentWeek => "Current Week",
            DateFilter::CurrentMonth => "Current Month",
            DateFilter::NextWeek => "Next Week",
            DateFilter::Custom { .. } => "Custom Range",
        }
    }

    /// Cache key. Custom ranges include their bounds so two different ranges
    /// never share an entry.
    pub fn key(&self) -> String {
        match self {
            DateFilter::Custom { start, end } => format!("Custom Range:{start}..{end}"),
            DateFilter::All => "All".to_string(),
            other => other.label().to_string(),
        }
    }

    /// The explicit range the filter engine must enforce, if any.
    pub fn custom_range(&self) -> Option<DateRange> {
        match self {
            DateFilter::Custom { start, end } => Some(DateRange {
                from: *start,
                to: *end,
            }),
            _ => None,
        }
    }

    /// The window of local calendar days fetched for this selector.
    pub fn window(&self, today: NaiveDate, all_since: NaiveDate) -> DateRange {
        let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);

        let (from, to) = match *self {
            DateFilter::All => (all_since, today),
            DateFilter::Last7Days => (today - Duration::days(7), today),
            DateFilter::Last30Days => (today - Duration::days(30), today),
            DateFilter::Last90Days => (today - Duration::days(90), today),
            DateFilter::CurrentWeek => (week_start, week_start + Duration::days(6)),
            DateFilter::NextWeek => (
                week_start + Duration::days(7),
                week_start + Duration::days(13),
            ),
            DateFilter::CurrentMonth => {
                let first = today.with_day(1).unwrap_or(today);
                (first, last_day_of_month(first))
            }
            DateFilter::Custom { start, end } => (start, end),
        };

        DateRange { from, to }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFilter::Custom { start, end } => write!(f, "{start} to {end}"),
            other => f.write_str(other.label()),
        }
    }
}

impl FromStr for DateFilter {
    type Err = String;

    /// Parse a preset name as typed on the command line
    /// (`all`, `last-7-days`, `current-week`, ...). Custom ranges are built
    /// with [`DateFilter::custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "all" | "default" => Ok(DateFilter::All),
            "last-7-days" => Ok(DateFilter::Last7Days),
            "last-30-days" => Ok(DateFilter::Last30Days),
            "last-90-days" => Ok(DateFilter::Last90Days),
            "current-week" => Ok(DateFilter::CurrentWeek),
            "current-month" => Ok(DateFilter::CurrentMonth),
            "next-week" => Ok(DateFilter::NextWeek),
            _ => Err(format!(
                "Unknown date filter '{}'. Expected one of: all, last-7-days, last-30-days, \
                 last-90-days, current-week, current-month, next-week",
                s
            )),
        }
    }
}

/// An inclusive range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// `from` at the start of the day, with the zone's UTC offset.
    pub fn from_timestamp(&self, tz: &Tz) -> String {
        format_with_offset(self.from.and_time(NaiveTime::default()), tz)
    }

    /// `to` at 23:59:59, with the zone's UTC offset.
    pub fn to_timestamp(&self, tz: &Tz) -> String {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::default());
        format_with_offset(self.to.and_time(end_of_day), tz)
    }

    /// Search criteria selecting events that lie entirely inside the range.
    pub fn search_criteria(&self, tz: &Tz) -> String {
        format!(
            "((Start_DateTime:greater_equal:{})and(End_DateTime:less_equal:{}))",
            self.from_timestamp(tz),
            self.to_timestamp(tz)
        )
    }
}

/// Format a local wall-clock time as `YYYY-MM-DDTHH:MM:SS+HH:MM` in `tz`.
///
/// Times that fall in a DST gap are shifted forward by an hour, which is what
/// the CRM does with them anyway.
pub fn format_with_offset(local: NaiveDateTime, tz: &Tz) -> String {
    let resolved = tz
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest());

    match resolved {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        None => local.and_utc().format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
    }
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|next| next - Duration::days(1))
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-05-15 is a Wednesday
    const ALL_SINCE: (i32, u32, u32) = (2024, 1, 1);

    fn window(filter: DateFilter) -> DateRange {
        let (y, m, d) = ALL_SINCE;
        filter.window(date(2024, 5, 15), date(y, m, d))
    }

    #[test]
    fn all_runs_from_configured_start_to_today() {
        assert_eq!(
            window(DateFilter::All),
            DateRange {
                from: date(2024, 1, 1),
                to: date(2024, 5, 15)
            }
        );
    }

    #[test]
    fn last_n_days_ends_today() {
        assert_eq!(window(DateFilter::Last7Days).from, date(2024, 5, 8));
        assert_eq!(window(DateFilter::Last30Days).from, date(2024, 4, 15));
        assert_eq!(window(DateFilter::Last90Days).from, date(2024, 2, 15));
        assert_eq!(window(DateFilter::Last90Days).to, date(2024, 5, 15));
    }

    #[test]
    fn weeks_run_sunday_to_saturday() {
        assert_eq!(
            window(DateFilter::CurrentWeek),
            DateRange {
                from: date(2024, 5, 12),
                to: date(2024, 5, 18)
            }
        );
        assert_eq!(
            window(DateFilter::NextWeek),
            DateRange {
                from: date(2024, 5, 19),
                to: date(2024, 5, 25)
            }
        );
    }

    #[test]
    fn current_month_covers_whole_month() {
        assert_eq!(
            window(DateFilter::CurrentMonth),
            DateRange {
                from: date(2024, 5, 1),
                to: date(2024, 5, 31)
            }
        );
        let december = DateFilter::CurrentMonth.window(date(2024, 12, 3), date(2024, 1, 1));
        assert_eq!(december.to, date(2024, 12, 31));
    }

    #[test]
    fn custom_orders_bounds_and_keys_by_them() {
        let filter = DateFilter::custom(date(2024, 3, 10), date(2024, 3, 1));
        assert_eq!(
            filter.custom_range(),
            Some(DateRange {
                from: date(2024, 3, 1),
                to: date(2024, 3, 10)
            })
        );
        assert_eq!(filter.key(), "Custom Range:2024-03-01..2024-03-10");
        assert_ne!(
            filter.key(),
            DateFilter::custom(date(2024, 3, 1), date(2024, 3, 11)).key()
        );
    }

    #[test]
    fn timestamps_carry_zone_offset() {
        let tz: Tz = "Australia/Sydney".parse().unwrap();
        let range = DateRange {
            from: date(2024, 1, 1),
            to: date(2024, 1, 31),
        };
        assert_eq!(range.from_timestamp(&tz), "2024-01-01T00:00:00+11:00");
        assert_eq!(range.to_timestamp(&tz), "2024-01-31T23:59:59+11:00");
        assert_eq!(
            range.search_criteria(&tz),
            "((Start_DateTime:greater_equal:2024-01-01T00:00:00+11:00)\
             and(End_DateTime:less_equal:2024-01-31T23:59:59+11:00))"
        );

        // winter: standard time
        let june = DateRange {
            from: date(2024, 6, 3),
            to: date(2024, 6, 3),
        };
        assert_eq!(june.from_timestamp(&tz), "2024-06-03T00:00:00+10:00");
    }

    #[test]
    fn parses_cli_names() {
        assert_eq!("last-30-days".parse::<DateFilter>(), Ok(DateFilter::Last30Days));
        assert_eq!("Current Week".parse::<DateFilter>(), Ok(DateFilter::CurrentWeek));
        assert_eq!("default".parse::<DateFilter>(), Ok(DateFilter::All));
        assert!("yesterday".parse::<DateFilter>().is_err());
    }
}
