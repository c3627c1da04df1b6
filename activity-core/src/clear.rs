//! Clearing and erasing events, and the optional history record written
//! alongside.

use serde::Serialize;

use crate::record::{Participant, RawEvent, RecordRef, STATUS_CLOSED};

/// Outcomes offered by the "Result" picker of the clear dialog.
pub const RESULTS: [&str; 41] = [
    "Call Attempted",
    "Call Completed",
    "Call Left Message",
    "Call Received",
    "Meeting Held",
    "Meeting Not Held",
    "To-do Done",
    "To-do Not Done",
    "Appointment Completed",
    "Appointment Not Completed",
    "Boardroom - Completed",
    "Boardroom - Not Completed",
    "Call Billing - Completed",
    "Initial Consultation - Completed",
    "Initial Consultation - Not Completed",
    "Mail - Completed",
    "Mail - Not Completed",
    "Meeting Billing - Completed",
    "Meeting Billing - Not Completed",
    "Personal Activity - Completed",
    "Personal Activity - Not Completed",
    "Note",
    "Mail Received",
    "Mail Sent",
    "Email Received",
    "Courier Sent",
    "Email Sent",
    "Payment Received",
    "Room 1 - Completed",
    "Room 1 - Not Completed",
    "Room 2 - Completed",
    "Room 2 - Not Completed",
    "Room 3 - Completed",
    "Room 3 - Not Completed",
    "To Do Billing - Completed",
    "To Do Billing - Not Completed",
    "Vacation - Completed",
    "Vacation - Not Completed",
    "Vacation Cancelled",
    "Attachment",
    "E-mail Attachment",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearAction {
    /// Mark the event closed.
    Clear,
    /// Delete the event.
    Erase,
}

impl ClearAction {
    pub fn past_tense(&self) -> &'static str {
        match self {
            ClearAction::Clear => "marked as cleared",
            ClearAction::Erase => "erased",
        }
    }
}

/// The two linked checkboxes of the clear dialog. At most one is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearChoice {
    clear: bool,
    erase: bool,
}

impl ClearChoice {
    /// Initial state for an event: "clear" starts checked if it already is.
    pub fn for_event(event: &RawEvent) -> Self {
        ClearChoice {
            clear: event.is_closed(),
            erase: false,
        }
    }

    pub fn set_clear(&mut self, checked: bool) {
        self.clear = checked;
        if checked {
            self.erase = false;
        }
    }

    pub fn set_erase(&mut self, checked: bool) {
        self.erase = checked;
        if checked {
            self.clear = false;
        }
    }

    pub fn clear_checked(&self) -> bool {
        self.clear
    }

    pub fn erase_checked(&self) -> bool {
        self.erase
    }

    /// The action to submit; `None` while neither box is checked.
    pub fn action(&self) -> Option<ClearAction> {
        match (self.clear, self.erase) {
            (true, false) => Some(ClearAction::Clear),
            (false, true) => Some(ClearAction::Erase),
            _ => None,
        }
    }
}

/// What the clear dialog submits.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearRequest {
    pub action: ClearAction,
    pub result: Option<String>,
    /// When set, a history record with these details is written too.
    pub history_details: Option<String>,
}

impl ClearRequest {
    pub fn new(action: ClearAction) -> Self {
        ClearRequest {
            action,
            result: None,
            history_details: None,
        }
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_history(mut self, details: impl Into<String>) -> Self {
        self.history_details = Some(details.into());
        self
    }
}

/// Update body that closes an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosePayload {
    pub id: String,
    #[serde(rename = "Event_Status")]
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl ClosePayload {
    pub fn new(id: &str, result: Option<String>) -> Self {
        ClosePayload {
            id: id.to_string(),
            status: STATUS_CLOSED,
            result,
        }
    }
}

/// A `History1` record summarising a cleared or erased event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPayload {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Duration", skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(rename = "History_Type", skip_serializing_if = "Option::is_none")]
    pub history_type: Option<String>,
    #[serde(rename = "Stakeholder", skip_serializing_if = "Option::is_none")]
    pub stakeholder: Option<RecordRef>,
    #[serde(rename = "Regarding", skip_serializing_if = "Option::is_none")]
    pub regarding: Option<String>,
    #[serde(rename = "Date", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "Owner", skip_serializing_if = "Option::is_none")]
    pub owner: Option<RecordRef>,
    #[serde(rename = "History_Details_Plain")]
    pub details: String,
    #[serde(rename = "History_Result", skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl HistoryPayload {
    pub fn for_event(event: &RawEvent, details: &str, result: Option<&str>) -> Self {
        let names: Vec<&str> = event
            .participant_list()
            .iter()
            .filter_map(Participant::display_name)
            .collect();
        let name = if names.is_empty() {
            event.title.clone().unwrap_or_default()
        } else {
            names.join(", ")
        };

        HistoryPayload {
            name,
            duration: event.duration_min.clone(),
            history_type: event.activity_type.clone(),
            stakeholder: event
                .what_id
                .as_ref()
                .and_then(|w| w.id.clone())
                .map(RecordRef::id),
            regarding: event.regarding.clone(),
            date: event.start.clone(),
            owner: event.owner.clone(),
            details: details.to_string(),
            result: result.map(str::to_string),
        }
    }
}

/// A `History_X_Contacts` row linking a history record to one contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryContactLink {
    #[serde(rename = "Contact_Details")]
    pub contact: RecordRef,
    #[serde(rename = "Contact_History_Info")]
    pub history: RecordRef,
}

/// One link per contact participant of `event`.
pub fn contact_links(event: &RawEvent, history_id: &str) -> Vec<HistoryContactLink> {
    event
        .participant_list()
        .iter()
        .filter(|p| p.is_contact())
        .filter_map(Participant::participant_id)
        .map(|contact_id| HistoryContactLink {
            contact: RecordRef::id(contact_id),
            history: RecordRef::id(history_id),
        })
        .collect()
}

/// Duration shown in the clear dialog: "5 minutes" when unknown, minutes
/// below an hour, whole hours above.
pub fn duration_label(duration_min: Option<&str>) -> String {
    let minutes = match duration_min
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| d.parse::<u32>().ok())
    {
        None | Some(0) => return "5 minutes".to_string(),
        Some(m) => m,
    };

    if minutes < 60 {
        format!("{minutes} minutes")
    } else {
        let hours = minutes / 60;
        format!("{hours} hour{}", if hours > 1 { "s" } else { "" })
    }
}
