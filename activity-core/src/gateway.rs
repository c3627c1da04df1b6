//! The mutation gateway: create, update, clear and erase against the CRM.
//!
//! Every operation returns a [`Change`] instead of touching any collection;
//! the board folds it into its own state with [`Change::fold`].

use chrono_tz::Tz;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;

use crate::clear::{ClearAction, ClearRequest, ClosePayload, HistoryPayload, contact_links};
use crate::crm::{
    Crm, DeleteRecord, GetRecord, InsertRecord, RecordStatus, UpdateRecord, WORKFLOW_TRIGGER,
    module,
};
use crate::draft::{EventDraft, EventPayload};
use crate::error::{BoardError, BoardResult};
use crate::record::{RawEvent, RecordRef, STATUS_CLOSED};

/// A successful mutation, ready to be applied to a record list.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// New records, in the order they were created.
    Created(Vec<RawEvent>),
    /// The full merged record replacing the one with the same id.
    Updated(RawEvent),
    Closed { id: String, result: Option<String> },
    Erased { id: String },
}

impl Change {
    /// Apply to `events`, returning the new list.
    ///
    /// Created records go to the front (latest first); an update keeps the
    /// record's position. Changes naming an unknown id leave the list as is.
    pub fn fold(&self, events: &[RawEvent]) -> Vec<RawEvent> {
        match self {
            Change::Created(created) => created
                .iter()
                .rev()
                .chain(events.iter())
                .cloned()
                .collect(),
            Change::Updated(updated) => events
                .iter()
                .map(|event| {
                    if event.id().is_some() && event.id() == updated.id() {
                        updated.clone()
                    } else {
                        event.clone()
                    }
                })
                .collect(),
            Change::Closed { id, result } => events
                .iter()
                .map(|event| {
                    let mut event = event.clone();
                    if event.id() == Some(id.as_str()) {
                        event.status = Some(STATUS_CLOSED.to_string());
                        event.result = result.clone();
                    }
                    event
                })
                .collect(),
            Change::Erased { id } => events
                .iter()
                .filter(|event| event.id() != Some(id.as_str()))
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    pub change: Change,
    /// Inserts that failed when creating one event per contact.
    pub failed: usize,
}

impl CreateOutcome {
    pub fn created(&self) -> usize {
        match &self.change {
            Change::Created(records) => records.len(),
            _ => 0,
        }
    }
}

/// What happened to the optional history record of a clear/erase.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryStatus {
    NotRequested,
    Written { links: usize, failed_links: usize },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClearOutcome {
    pub change: Change,
    pub history: HistoryStatus,
}

pub struct Gateway<'a, C: Crm + ?Sized> {
    crm: &'a C,
    tz: &'a Tz,
}

impl<'a, C: Crm + ?Sized> Gateway<'a, C> {
    pub fn new(crm: &'a C, tz: &'a Tz) -> Self {
        Gateway { crm, tz }
    }

    /// Fetch a single event, as the edit and clear dialogs do before opening.
    pub async fn prefetch(&self, id: &str) -> BoardResult<RawEvent> {
        let record = self
            .crm
            .get_record(GetRecord {
                module: module::EVENTS.to_string(),
                id: id.to_string(),
            })
            .await?
            .ok_or_else(|| BoardError::RecordNotFound(id.to_string()))?;

        Ok(serde_json::from_value(record)?)
    }

    /// Insert the draft. Nothing is sent if it does not validate.
    ///
    /// With `separate_per_contact` one event is inserted per participant;
    /// failed inserts are counted and the successful ones kept.
    pub async fn create(&self, draft: &EventDraft) -> BoardResult<CreateOutcome> {
        let payloads = draft.create_payloads(self.tz)?;

        if !draft.separate_per_contact {
            let mut created = Vec::with_capacity(payloads.len());
            for payload in &payloads {
                created.push(self.insert_event(payload, draft).await?);
            }
            return Ok(CreateOutcome {
                change: Change::Created(created),
                failed: 0,
            });
        }

        let mut created = Vec::new();
        let mut failed = 0;
        for payload in &payloads {
            match self.insert_event(payload, draft).await {
                Ok(event) => created.push(event),
                Err(e) => {
                    tracing::warn!(title = %payload.title, error = %e, "event insert failed");
                    failed += 1;
                }
            }
        }

        Ok(CreateOutcome {
            change: Change::Created(created),
            failed,
        })
    }

    async fn insert_event(&self, payload: &EventPayload, draft: &EventDraft) -> BoardResult<RawEvent> {
        let status = self
            .crm
            .insert_record(InsertRecord {
                module: module::EVENTS.to_string(),
                data: serde_json::to_value(payload)?,
                trigger: vec![WORKFLOW_TRIGGER.to_string()],
            })
            .await?
            .ensure_success("event creation")?;

        let id = status.record_id().map(str::to_string);
        tracing::info!(id = id.as_deref().unwrap_or("?"), "event created");
        local_record(payload, draft, None, id)
    }

    /// Send the edited draft for `existing`. On success the change carries
    /// the old record with the submitted fields merged over it.
    pub async fn update(&self, existing: &RawEvent, draft: &EventDraft) -> BoardResult<Change> {
        let id = existing
            .id()
            .ok_or_else(|| BoardError::RecordNotFound("event without id".into()))?;
        let payload = draft.update_payload(id, self.tz)?;

        self.crm
            .update_record(UpdateRecord {
                module: module::EVENTS.to_string(),
                id: id.to_string(),
                data: serde_json::to_value(&payload)?,
                trigger: vec![WORKFLOW_TRIGGER.to_string()],
            })
            .await?
            .ensure_success("event update")?;

        tracing::info!(id, "event updated");
        Ok(Change::Updated(local_record(
            &payload,
            draft,
            Some(existing),
            Some(id.to_string()),
        )?))
    }

    /// Close or delete `event`, then write the history record if asked.
    ///
    /// A history failure never undoes the primary change; it is reported in
    /// the outcome instead.
    pub async fn clear_or_erase(
        &self,
        event: &RawEvent,
        request: &ClearRequest,
    ) -> BoardResult<ClearOutcome> {
        let id = event
            .id()
            .ok_or_else(|| BoardError::RecordNotFound("event without id".into()))?
            .to_string();

        let change = match request.action {
            ClearAction::Clear => {
                let payload = ClosePayload::new(&id, request.result.clone());
                self.crm
                    .update_record(UpdateRecord {
                        module: module::EVENTS.to_string(),
                        id: id.clone(),
                        data: serde_json::to_value(&payload)?,
                        trigger: Vec::new(),
                    })
                    .await?
                    .ensure_success("clear")?;
                Change::Closed {
                    id,
                    result: request.result.clone(),
                }
            }
            ClearAction::Erase => {
                self.crm
                    .delete_record(DeleteRecord {
                        module: module::EVENTS.to_string(),
                        id: id.clone(),
                    })
                    .await?
                    .ensure_success("erase")?;
                Change::Erased { id }
            }
        };
        tracing::info!("event {}", request.action.past_tense());

        let history = match &request.history_details {
            None => HistoryStatus::NotRequested,
            Some(details) => self.write_history(event, details, request.result.as_deref()).await,
        };

        Ok(ClearOutcome { change, history })
    }

    async fn write_history(&self, event: &RawEvent, details: &str, result: Option<&str>) -> HistoryStatus {
        let payload = HistoryPayload::for_event(event, details, result);

        let history_id = match self.insert(module::HISTORY, &payload, "history creation").await {
            Ok(status) => match status.record_id() {
                Some(id) => id.to_string(),
                None => return HistoryStatus::Failed("history record has no id".into()),
            },
            Err(e) => {
                tracing::warn!(error = %e, "history creation failed");
                return HistoryStatus::Failed(e.to_string());
            }
        };

        let links = contact_links(event, &history_id);
        let results = join_all(
            links
                .iter()
                .map(|link| self.insert(module::HISTORY_CONTACTS, link, "history contact link")),
        )
        .await;

        let failed_links = results.iter().filter(|r| r.is_err()).count();
        if failed_links > 0 {
            tracing::warn!(failed_links, "some history contact links failed");
        }

        HistoryStatus::Written {
            links: results.len(),
            failed_links,
        }
    }

    async fn insert<T: Serialize>(&self, module: &str, data: &T, action: &str) -> BoardResult<RecordStatus> {
        self.crm
            .insert_record(InsertRecord {
                module: module.to_string(),
                data: serde_json::to_value(data)?,
                trigger: vec![WORKFLOW_TRIGGER.to_string()],
            })
            .await?
            .ensure_success(action)
    }
}

/// The record as the board should show it after a successful write: `base`
/// (if any) with the submitted fields laid over it. Lookup names come from
/// the draft since the payload only carries ids.
fn local_record(
    payload: &EventPayload,
    draft: &EventDraft,
    base: Option<&RawEvent>,
    id: Option<String>,
) -> BoardResult<RawEvent> {
    let mut record = match base {
        Some(old) => serde_json::to_value(old)?,
        None => Value::Object(Default::default()),
    };

    if let (Value::Object(target), Value::Object(fields)) = (&mut record, serde_json::to_value(payload)?) {
        target.extend(fields);
    }

    let mut event: RawEvent = serde_json::from_value(record)?;
    if id.is_some() {
        event.id = id;
    }
    if let Some(owner) = &draft.scheduled_for {
        event.owner = Some(RecordRef {
            id: Some(owner.id.clone()),
            name: Some(owner.full_name.clone()),
        });
    }
    if draft.account.is_some() {
        event.what_id = draft.account.clone();
    }
    Ok(event)
}
