//! Vendor-shaped CRM records.
//!
//! These mirror what the CRM hands back for the `Events` and `users` modules.
//! Every field is optional: records coming from different endpoints (search vs
//! listing vs a freshly inserted payload) carry different subsets, and a
//! missing field must never make a record unreadable. Fields this crate does
//! not model are kept in `extra` so an update can send them back untouched.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Status value the CRM uses for a cleared (closed) event.
pub const STATUS_CLOSED: &str = "Closed";

/// A lookup reference such as `Owner` or `What_Id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RecordRef {
    pub fn id(id: impl Into<String>) -> Self {
        RecordRef {
            id: Some(id.into()),
            name: None,
        }
    }
}

/// The user an event is scheduled for, as written by older form versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// The account an event is associated with, as written by older form versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociateWith {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        rename = "Account_Name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub account_name: Option<String>,
}

/// A contact (or other entity) linked to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Full_Name", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Identifier of the linked record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    /// Lookup results carry the contact id here instead of `participant`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Participant {
    /// Name shown in the table: `name`, falling back to `Full_Name`.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.full_name.as_deref())
    }

    pub fn participant_id(&self) -> Option<&str> {
        self.participant.as_deref().or(self.id.as_deref())
    }

    pub fn is_contact(&self) -> bool {
        self.kind.as_deref() == Some("contact")
    }
}

/// An event/activity record as stored by the CRM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Event_Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        rename = "Type_of_Activity",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub activity_type: Option<String>,
    #[serde(
        rename = "Start_DateTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<String>,
    #[serde(rename = "End_DateTime", default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(
        rename = "Duration_Min",
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_min: Option<String>,
    #[serde(rename = "Owner", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<RecordRef>,
    #[serde(rename = "What_Id", default, skip_serializing_if = "Option::is_none")]
    pub what_id: Option<RecordRef>,
    #[serde(rename = "Participants", default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
    #[serde(
        rename = "Event_Priority",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<String>,
    #[serde(rename = "Regarding", default, skip_serializing_if = "Option::is_none")]
    pub regarding: Option<String>,
    #[serde(rename = "Event_Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "Colour", default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Created_Time", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(rename = "Venue", default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(rename = "Banner", default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<bool>,
    #[serde(rename = "Reminder_Text", default, skip_serializing_if = "Option::is_none")]
    pub reminder_text: Option<String>,
    #[serde(rename = "Remind_At", default, skip_serializing_if = "Option::is_none")]
    pub remind_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    // Secondary shapes written by older form versions
    #[serde(rename = "scheduleFor", default, skip_serializing_if = "Option::is_none")]
    pub schedule_for: Option<ScheduleFor>,
    #[serde(rename = "associateWith", default, skip_serializing_if = "Option::is_none")]
    pub associate_with: Option<AssociateWith>,
    #[serde(rename = "scheduledWith", default, skip_serializing_if = "Option::is_none")]
    pub scheduled_with: Option<Vec<Participant>>,

    /// Fields not modelled above, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawEvent {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_time.as_deref().and_then(parse_timestamp)
    }

    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        self.start.as_deref().and_then(parse_timestamp)
    }

    pub fn is_closed(&self) -> bool {
        self.status.as_deref() == Some(STATUS_CLOSED)
    }

    /// Primary participant list, falling back to the secondary `scheduledWith`.
    pub fn participant_list(&self) -> &[Participant] {
        self.participants
            .as_deref()
            .or(self.scheduled_with.as_deref())
            .unwrap_or(&[])
    }
}

/// A CRM user (the `users` module).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Parse a CRM timestamp.
///
/// Accepts RFC 3339 (`2024-03-01T10:00:00+11:00`), a naive `YYYY-MM-DDTHH:MM:SS`
/// (read as UTC) and a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// `Duration_Min` arrives as a string from some endpoints and as a number from
/// others. Empty strings and a numeric zero read as absent.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}
