//! Row filtering for the activity table.

use serde::{Deserialize, Serialize};

use crate::date_range::DateFilter;
use crate::row::DisplayRow;

/// Activity types offered by the type selector.
pub const ACTIVITY_TYPES: [&str; 16] = [
    "Meeting",
    "To-Do",
    "Call",
    "Appointment",
    "Boardroom",
    "Call Billing",
    "Email Billing",
    "Initial Consultation",
    "Mail",
    "Meeting Billing",
    "Personal Activity",
    "Room 1",
    "Room 2",
    "Room 3",
    "Todo Billing",
    "Vacation",
];

pub const PRIORITIES: [&str; 3] = ["Low", "Medium", "High"];

/// Everything the user has selected above the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub date: DateFilter,
    pub types: Vec<String>,
    pub priorities: Vec<String>,
    /// Selected user display names.
    pub users: Vec<String>,
    pub show_cleared: bool,
}

impl FilterState {
    /// Reset to the default preset with nothing selected.
    ///
    /// The "Cleared" checkbox is a view toggle, not a filter selection, so it
    /// is left alone.
    pub fn clear(&mut self) {
        self.date = DateFilter::All;
        self.types.clear();
        self.priorities.clear();
        self.users.clear();
    }

    pub fn matches(&self, row: &DisplayRow) -> bool {
        let type_match = self.types.is_empty() || self.types.contains(&row.activity_type);
        let priority_match =
            self.priorities.is_empty() || self.priorities.contains(&row.priority);
        // Substring match: owner names are not always formatted identically.
        let user_match = self.users.is_empty()
            || self
                .users
                .iter()
                .any(|user| row.scheduled_for.contains(user.as_str()));
        let date_match = self
            .date
            .custom_range()
            .is_none_or(|range| range.contains(row.date));
        let cleared_match = !self.show_cleared || row.is_closed();

        type_match && priority_match && user_match && date_match && cleared_match
    }

    /// Keep the matching rows, most recent date first. Rows on the same date
    /// keep their relative order.
    pub fn apply(&self, rows: &[DisplayRow]) -> Vec<DisplayRow> {
        let mut filtered: Vec<DisplayRow> = rows
            .iter()
            .filter(|row| self.matches(row))
            .cloned()
            .collect();
        filtered.sort_by(|a, b| b.date.cmp(&a.date));
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(id: &str, on: NaiveDate) -> DisplayRow {
        DisplayRow {
            id: id.to_string(),
            title: format!("Event {id}"),
            activity_type: "Meeting".to_string(),
            date: on,
            time: "09:00".to_string(),
            duration: "-".to_string(),
            scheduled_for: "Sam Carter".to_string(),
            scheduled_with: vec![],
            associate_with: "None".to_string(),
            priority: "Low".to_string(),
            regarding: "No Data".to_string(),
            status: String::new(),
            color: "black".to_string(),
        }
    }

    fn ids(rows: &[DisplayRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<DisplayRow> {
        vec![
            row("a", date(2024, 1, 10)),
            row("b", date(2024, 3, 5)),
            row("c", date(2024, 1, 10)),
            row("d", date(2024, 2, 20)),
        ]
    }

    #[test]
    fn empty_filter_returns_everything_date_descending() {
        let result = FilterState::default().apply(&sample());
        assert_eq!(ids(&result), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn custom_range_bounds_are_inclusive() {
        let rows = vec![
            row("before", date(2024, 1, 31)),
            row("start", date(2024, 2, 1)),
            row("inside", date(2024, 2, 14)),
            row("end", date(2024, 2, 29)),
            row("after", date(2024, 3, 1)),
        ];
        let state = FilterState {
            date: DateFilter::custom(date(2024, 2, 1), date(2024, 2, 29)),
            ..Default::default()
        };

        assert_eq!(ids(&state.apply(&rows)), vec!["end", "inside", "start"]);
    }

    #[test]
    fn presets_do_not_constrain_dates() {
        let state = FilterState {
            date: DateFilter::Last7Days,
            ..Default::default()
        };
        assert_eq!(state.apply(&sample()).len(), 4);
    }

    #[test]
    fn type_and_priority_sets() {
        let mut rows = sample();
        rows[0].activity_type = "Call".into();
        rows[1].priority = "High".into();
        rows[2].activity_type = "Call".into();
        rows[2].priority = "High".into();

        let calls = FilterState {
            types: vec!["Call".into()],
            ..Default::default()
        };
        assert_eq!(ids(&calls.apply(&rows)), vec!["a", "c"]);

        let high_calls = FilterState {
            types: vec!["Call".into()],
            priorities: vec!["High".into()],
            ..Default::default()
        };
        assert_eq!(ids(&high_calls.apply(&rows)), vec!["c"]);
    }

    #[test]
    fn user_filter_matches_substrings() {
        let mut rows = sample();
        rows[1].scheduled_for = "Alex Morgan".into();

        let state = FilterState {
            users: vec!["Carter".into()],
            ..Default::default()
        };
        assert_eq!(ids(&state.apply(&rows)), vec!["d", "a", "c"]);
    }

    #[test]
    fn show_cleared_keeps_closed_rows_only() {
        let mut rows = sample();
        rows[3].status = "Closed".into();

        let state = FilterState {
            show_cleared: true,
            ..Default::default()
        };
        assert_eq!(ids(&state.apply(&rows)), vec!["d"]);
    }

    #[test]
    fn applying_twice_is_the_same_as_once() {
        let mut rows = sample();
        rows[0].priority = "Medium".into();
        let state = FilterState {
            priorities: vec!["Low".into()],
            ..Default::default()
        };

        let once = state.apply(&rows);
        let twice = state.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn clear_resets_selection() {
        let mut state = FilterState {
            date: DateFilter::NextWeek,
            types: vec!["Call".into()],
            priorities: vec!["High".into()],
            users: vec!["Sam".into()],
            show_cleared: true,
        };
        state.clear();
        assert_eq!(state.date, DateFilter::All);
        assert!(state.types.is_empty() && state.priorities.is_empty() && state.users.is_empty());
        assert!(state.show_cleared);
    }
}
