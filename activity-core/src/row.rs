//! Projection of raw CRM records into flat table rows.
//!
//! This is the single place where missing vendor fields get their defaults.
//! Everything downstream (filtering, rendering) works on [`DisplayRow`] only.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::record::{Participant, RawEvent, STATUS_CLOSED};

pub const DEFAULT_ACTIVITY_TYPE: &str = "Other";
pub const NO_ID: &str = "No ID";
pub const UNTITLED: &str = "Untitled Event";
pub const UNKNOWN_OWNER: &str = "Unknown";
pub const NO_ASSOCIATION: &str = "None";
pub const NO_DURATION: &str = "-";
pub const DEFAULT_PRIORITY: &str = "Low";
pub const NO_REGARDING: &str = "No Data";
pub const DEFAULT_COLOR: &str = "black";

/// One row of the activity table, derived from exactly one [`RawEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub id: String,
    pub title: String,
    pub activity_type: String,
    pub date: NaiveDate,
    pub time: String,
    pub duration: String,
    pub scheduled_for: String,
    pub scheduled_with: Vec<Participant>,
    pub associate_with: String,
    pub priority: String,
    pub regarding: String,
    pub status: String,
    pub color: String,
}

impl DisplayRow {
    /// Project a record with an explicit activity type.
    ///
    /// Total: every missing field gets its default. A record without a start
    /// time is shown at `now`.
    pub fn project(event: &RawEvent, activity_type: &str, tz: &Tz, now: DateTime<Utc>) -> Self {
        let start = event.start_at().unwrap_or(now).with_timezone(tz);

        let scheduled_for = present(event.owner.as_ref().and_then(|o| o.name.as_deref()))
            .or_else(|| present(event.schedule_for.as_ref().and_then(|s| s.full_name.as_deref())))
            .unwrap_or(UNKNOWN_OWNER);

        let associate_with = present(event.what_id.as_ref().and_then(|w| w.name.as_deref()))
            .or_else(|| {
                present(
                    event
                        .associate_with
                        .as_ref()
                        .and_then(|a| a.account_name.as_deref()),
                )
            })
            .unwrap_or(NO_ASSOCIATION);

        let duration = present(event.duration_min.as_deref())
            .map(|minutes| format!("{minutes} minutes"))
            .unwrap_or_else(|| NO_DURATION.to_string());

        DisplayRow {
            id: present(event.id()).unwrap_or(NO_ID).to_string(),
            title: or_default(&event.title, UNTITLED),
            activity_type: activity_type.to_string(),
            date: start.date_naive(),
            time: start.format("%H:%M").to_string(),
            duration,
            scheduled_for: scheduled_for.to_string(),
            scheduled_with: event.participant_list().to_vec(),
            associate_with: associate_with.to_string(),
            priority: or_default(&event.priority, DEFAULT_PRIORITY),
            regarding: or_default(&event.regarding, NO_REGARDING),
            status: event.status.clone().unwrap_or_default(),
            color: or_default(&event.colour, DEFAULT_COLOR),
        }
    }

    /// Project a record using its own activity type, or "Other".
    pub fn from_event(event: &RawEvent, tz: &Tz, now: DateTime<Utc>) -> Self {
        let activity_type = present(event.activity_type.as_deref()).unwrap_or(DEFAULT_ACTIVITY_TYPE);
        Self::project(event, activity_type, tz, now)
    }

    /// Date as shown in the table (`DD/MM/YYYY`).
    pub fn formatted_date(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }

    pub fn is_closed(&self) -> bool {
        self.status == STATUS_CLOSED
    }

    /// Comma-separated participant names, or "No Participants".
    pub fn participant_names(&self) -> String {
        let names: Vec<&str> = self
            .scheduled_with
            .iter()
            .filter_map(Participant::display_name)
            .collect();

        if names.is_empty() {
            "No Participants".to_string()
        } else {
            names.join(", ")
        }
    }
}

/// Project a whole collection, preserving order.
pub fn project_all(events: &[RawEvent], tz: &Tz, now: DateTime<Utc>) -> Vec<DisplayRow> {
    events
        .iter()
        .map(|event| DisplayRow::from_event(event, tz, now))
        .collect()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn or_default(value: &Option<String>, default: &str) -> String {
    present(value.as_deref()).unwrap_or(default).to_string()
}
