//! Event drafts: what the create/edit forms collect, how they are validated,
//! and how they are turned into the payload the CRM expects.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date_range::format_with_offset;
use crate::record::{Participant, RawEvent, RecordRef, User};

/// Length given to a new event when only its start is known.
const DEFAULT_LENGTH_MIN: u32 = 60;

/// Module a `What_Id` association points at.
const ASSOCIATION_MODULE: &str = "Accounts";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// When to remind the owner before the event starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reminder {
    #[default]
    None,
    AtTimeOfMeeting,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    TwoHours,
    OneDay,
    TwoDays,
}

impl Reminder {
    pub const ALL: [Reminder; 9] = [
        Reminder::None,
        Reminder::AtTimeOfMeeting,
        Reminder::FiveMinutes,
        Reminder::FifteenMinutes,
        Reminder::ThirtyMinutes,
        Reminder::OneHour,
        Reminder::TwoHours,
        Reminder::OneDay,
        Reminder::TwoDays,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Reminder::None => "None",
            Reminder::AtTimeOfMeeting => "At time of meeting",
            Reminder::FiveMinutes => "5 minutes before",
            Reminder::FifteenMinutes => "15 minutes before",
            Reminder::ThirtyMinutes => "30 minutes before",
            Reminder::OneHour => "1 hour before",
            Reminder::TwoHours => "2 hours before",
            Reminder::OneDay => "1 day before",
            Reminder::TwoDays => "2 days before",
        }
    }

    /// Local wall-clock time of the reminder, or `None` for no reminder.
    /// Day offsets move the calendar day and keep the clock time.
    pub fn remind_at(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        let offset = match self {
            Reminder::None => return None,
            Reminder::AtTimeOfMeeting => Duration::zero(),
            Reminder::FiveMinutes => Duration::minutes(5),
            Reminder::FifteenMinutes => Duration::minutes(15),
            Reminder::ThirtyMinutes => Duration::minutes(30),
            Reminder::OneHour => Duration::hours(1),
            Reminder::TwoHours => Duration::hours(2),
            Reminder::OneDay => Duration::days(1),
            Reminder::TwoDays => Duration::days(2),
        };
        start.checked_sub_signed(offset)
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Reminder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Ok(Reminder::None);
        }
        Reminder::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let labels: Vec<_> = Reminder::ALL.iter().map(|r| r.label()).collect();
                format!("Unknown reminder '{}'. Expected one of: {}", s, labels.join(", "))
            })
    }
}

/// The fields of the create/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub activity_type: String,
    pub title: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub duration_min: Option<u32>,
    /// Owner of the event.
    pub scheduled_for: Option<User>,
    pub participants: Vec<Participant>,
    /// Associated account.
    pub account: Option<RecordRef>,
    pub priority: String,
    pub description: String,
    pub colour: Option<String>,
    pub regarding: String,
    pub venue: String,
    pub banner: bool,
    pub reminder: Reminder,
    /// Create one event per participant instead of one shared event.
    pub separate_per_contact: bool,
}

impl Default for EventDraft {
    fn default() -> Self {
        EventDraft {
            activity_type: String::new(),
            title: String::new(),
            start: None,
            end: None,
            duration_min: None,
            scheduled_for: None,
            participants: Vec::new(),
            account: None,
            priority: "Medium".to_string(),
            description: String::new(),
            colour: None,
            regarding: String::new(),
            venue: String::new(),
            banner: false,
            reminder: Reminder::None,
            separate_per_contact: false,
        }
    }
}

impl EventDraft {
    /// A blank draft scheduled for `owner` (usually the logged-in user).
    pub fn for_owner(owner: Option<User>) -> Self {
        EventDraft {
            scheduled_for: owner,
            ..Default::default()
        }
    }

    /// Pre-fill the edit form from an existing record.
    pub fn from_event(event: &RawEvent, tz: &Tz) -> Self {
        let local = |ts: Option<chrono::DateTime<chrono::Utc>>| {
            ts.map(|dt| dt.with_timezone(tz).naive_local())
        };

        EventDraft {
            activity_type: event.activity_type.clone().unwrap_or_default(),
            title: event.title.clone().unwrap_or_default(),
            start: local(event.start_at()),
            end: local(event.end.as_deref().and_then(crate::record::parse_timestamp)),
            duration_min: event.duration_min.as_deref().and_then(|d| d.parse().ok()),
            scheduled_for: event.owner.as_ref().and_then(|owner| {
                owner.id.as_ref().map(|id| User {
                    id: id.clone(),
                    full_name: owner.name.clone().unwrap_or_default(),
                    email: None,
                })
            }),
            participants: event.participant_list().to_vec(),
            account: event.what_id.clone(),
            priority: event.priority.clone().unwrap_or_default(),
            description: event.description.clone().unwrap_or_default(),
            colour: event.colour.clone(),
            regarding: event.regarding.clone().unwrap_or_default(),
            venue: event.venue.clone().unwrap_or_default(),
            banner: event.banner.unwrap_or(false),
            reminder: event
                .reminder_text
                .as_deref()
                .and_then(|text| text.parse().ok())
                .unwrap_or_default(),
            separate_per_contact: false,
        }
    }

    /// Set the start. The end moves to an hour later when it is missing or
    /// not after the new start; the duration follows.
    pub fn set_start(&mut self, start: NaiveDateTime) {
        let end = match self.end {
            Some(end) if end > start => end,
            _ => start + Duration::minutes(DEFAULT_LENGTH_MIN as i64),
        };
        self.start = Some(start);
        self.end = Some(end);
        self.duration_min = Some(minutes_between(start, end));
    }

    /// Set the end and recompute the duration from the start.
    pub fn set_end(&mut self, end: NaiveDateTime) {
        self.end = Some(end);
        if let Some(start) = self.start {
            self.duration_min = Some(minutes_between(start, end));
        }
    }

    /// Set the duration and move the end accordingly.
    pub fn set_duration(&mut self, minutes: u32) {
        self.duration_min = Some(minutes);
        if let Some(start) = self.start {
            self.end = Some(start + Duration::minutes(minutes as i64));
        }
    }

    /// Banner events always run 06:00 to 07:00 on their day.
    pub fn set_banner(&mut self, banner: bool, day: NaiveDate) {
        self.banner = banner;
        if banner {
            let six = NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default();
            self.start = Some(day.and_time(six));
            self.end = Some(day.and_time(six) + Duration::minutes(DEFAULT_LENGTH_MIN as i64));
            self.duration_min = Some(DEFAULT_LENGTH_MIN);
        }
    }

    /// Names of the required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.activity_type.trim().is_empty() {
            missing.push("activity type");
        }
        if self.start.is_none() {
            missing.push("start");
        }
        if self.end.is_none() {
            missing.push("end");
        }
        if self.duration_min.is_none_or(|d| d == 0) {
            missing.push("duration");
        }
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.participants.is_empty() {
            missing.push("participants");
        }
        missing
    }

    /// Whether the submit action should be enabled.
    pub fn is_submittable(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DraftError::MissingFields(missing))
        }
    }

    /// Payloads to insert: one shared event, or one per participant when
    /// `separate_per_contact` is set.
    pub fn create_payloads(&self, tz: &Tz) -> Result<Vec<EventPayload>, DraftError> {
        self.validate()?;

        if self.separate_per_contact {
            Ok(self
                .participants
                .iter()
                .map(|p| self.payload(tz, None, vec![invitee(p)], Some(p)))
                .collect())
        } else {
            let invitees = self.participants.iter().map(invitee).collect();
            Ok(vec![self.payload(tz, None, invitees, None)])
        }
    }

    /// Payload for updating record `id`. Participants are sent as they are.
    pub fn update_payload(&self, id: &str, tz: &Tz) -> Result<EventPayload, DraftError> {
        self.validate()?;
        Ok(self.payload(tz, Some(id.to_string()), self.participants.clone(), None))
    }

    fn payload(
        &self,
        tz: &Tz,
        id: Option<String>,
        participants: Vec<Participant>,
        individual: Option<&Participant>,
    ) -> EventPayload {
        let title = match individual.and_then(Participant::display_name) {
            Some(name) => format!("{} - {}", self.title, name),
            None => self.title.clone(),
        };

        let remind_at = self
            .start
            .and_then(|start| self.reminder.remind_at(start))
            .map(|at| format_with_offset(at, tz));

        let what_id = self
            .account
            .as_ref()
            .and_then(|a| a.id.as_ref())
            .map(|id| RecordRef::id(id.clone()));

        EventPayload {
            id,
            title,
            activity_type: self.activity_type.clone(),
            start: self.start.map(|s| format_with_offset(s, tz)),
            end: self.end.map(|e| format_with_offset(e, tz)),
            duration_min: self.duration_min.unwrap_or(0).to_string(),
            owner: self.scheduled_for.as_ref().map(|u| RecordRef::id(u.id.clone())),
            se_module: what_id.as_ref().map(|_| ASSOCIATION_MODULE),
            what_id,
            participants,
            priority: self.priority.clone(),
            description: self.description.clone(),
            colour: self.colour.clone(),
            regarding: self.regarding.clone(),
            venue: self.venue.clone(),
            banner: self.banner,
            reminder_text: (self.reminder != Reminder::None)
                .then(|| self.reminder.label().to_string()),
            send_notification: remind_at.as_ref().map(|_| true),
            remind_at,
        }
    }
}

/// An event in the shape the CRM accepts for insert/update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Event_Title")]
    pub title: String,
    #[serde(rename = "Type_of_Activity")]
    pub activity_type: String,
    #[serde(rename = "Start_DateTime", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(rename = "End_DateTime", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(rename = "Duration_Min")]
    pub duration_min: String,
    #[serde(rename = "Owner", skip_serializing_if = "Option::is_none")]
    pub owner: Option<RecordRef>,
    #[serde(rename = "What_Id", skip_serializing_if = "Option::is_none")]
    pub what_id: Option<RecordRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub se_module: Option<&'static str>,
    #[serde(rename = "Participants")]
    pub participants: Vec<Participant>,
    #[serde(rename = "Event_Priority")]
    pub priority: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Colour", skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(rename = "Regarding")]
    pub regarding: String,
    #[serde(rename = "Venue")]
    pub venue: String,
    #[serde(rename = "Banner")]
    pub banner: bool,
    #[serde(rename = "Reminder_Text", skip_serializing_if = "Option::is_none")]
    pub reminder_text: Option<String>,
    #[serde(rename = "Remind_At", skip_serializing_if = "Option::is_none")]
    pub remind_at: Option<String>,
    #[serde(rename = "$send_notification", skip_serializing_if = "Option::is_none")]
    pub send_notification: Option<bool>,
}

/// A picked contact in the shape the CRM expects for a new invitation.
fn invitee(contact: &Participant) -> Participant {
    Participant {
        name: contact.display_name().map(str::to_string),
        full_name: None,
        email: contact.email.clone(),
        participant: contact.participant_id().map(str::to_string),
        id: None,
        kind: Some("contact".to_string()),
        invited: Some(false),
        status: Some("not_known".to_string()),
    }
}

fn minutes_between(start: NaiveDateTime, end: NaiveDateTime) -> u32 {
    (end - start).num_minutes().max(0) as u32
}
