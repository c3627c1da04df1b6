//! The seam between the board and the CRM.
//!
//! The board never talks HTTP itself. It talks to something implementing
//! [`Crm`]; in production that is a [`Provider`] process speaking the JSON
//! protocol in [`protocol`].

pub mod protocol;
pub mod provider;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};
use crate::record::User;

pub use protocol::{
    DeleteRecord, GetOrgVariable, GetRecord, InsertRecord, ListRecords, SearchRecords,
    SetOrgVariable, UpdateRecord,
};
pub use provider::Provider;

/// Module (entity) names used by the board.
pub mod module {
    pub const EVENTS: &str = "Events";
    pub const CONTACTS: &str = "Contacts";
    pub const ACCOUNTS: &str = "Accounts";
    pub const HISTORY: &str = "History1";
    pub const HISTORY_CONTACTS: &str = "History_X_Contacts";
}

/// Automation trigger run on inserts and updates.
pub const WORKFLOW_TRIGGER: &str = "workflow";

/// Record-level code the CRM uses for a successful write.
pub const SUCCESS_CODE: &str = "SUCCESS";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SearchQuery {
    /// Criteria expression, e.g. `(First_Name:equals:Ann)`.
    Criteria(String),
    /// Full-text word search.
    Word(String),
}

/// One page of a module listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub more_records: bool,
}

/// The per-record outcome of a write.
///
/// A call can succeed at the transport level and still carry a failure code
/// here, so callers go through [`RecordStatus::ensure_success`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordStatus {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl RecordStatus {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Identifier the CRM assigned to (or confirmed for) the record.
    pub fn record_id(&self) -> Option<&str> {
        self.details.get("id").and_then(|v| v.as_str())
    }

    pub fn ensure_success(self, action: &str) -> BoardResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BoardError::Rejected {
                action: action.to_string(),
                code: self.code,
                message: self.message,
            })
        }
    }
}

/// Everything the board needs from the CRM.
#[async_trait]
pub trait Crm: Send + Sync {
    async fn list_records(&self, cmd: ListRecords) -> BoardResult<RecordPage>;

    async fn search_records(&self, cmd: SearchRecords) -> BoardResult<Vec<serde_json::Value>>;

    async fn get_record(&self, cmd: GetRecord) -> BoardResult<Option<serde_json::Value>>;

    async fn insert_record(&self, cmd: InsertRecord) -> BoardResult<RecordStatus>;

    async fn update_record(&self, cmd: UpdateRecord) -> BoardResult<RecordStatus>;

    async fn delete_record(&self, cmd: DeleteRecord) -> BoardResult<RecordStatus>;

    async fn get_org_variable(&self, cmd: GetOrgVariable) -> BoardResult<Option<String>>;

    async fn set_org_variable(&self, cmd: SetOrgVariable) -> BoardResult<()>;

    async fn list_users(&self) -> BoardResult<Vec<User>>;

    async fn current_user(&self) -> BoardResult<Option<User>>;
}
