//! Defines the JSON protocol used between activity-board and provider
//! binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::crm::{RecordPage, RecordStatus, SearchQuery, SortOrder};
use crate::record::User;

pub trait CrmCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListRecords,
    SearchRecords,
    GetRecord,
    InsertRecord,
    UpdateRecord,
    DeleteRecord,
    GetOrgVariable,
    SetOrgVariable,
    ListUsers,
    CurrentUser,
}

/// Request sent from the board to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider back to the board.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data })
            .unwrap_or_else(|e| Response::error(&format!("Failed to encode response: {e}")))
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        let escaped = serde_json::Value::String(msg.to_string());
        format!(r#"{{"status":"error","error":{escaped}}}"#)
    }
}

/// List one page of a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRecords {
    pub module: String,
    pub page: u32,
    pub per_page: u32,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl CrmCommand for ListRecords {
    type Response = RecordPage;
    fn command() -> Command {
        Command::ListRecords
    }
}

/// Search a module by criteria or full text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecords {
    pub module: String,
    pub query: SearchQuery,
}

impl CrmCommand for SearchRecords {
    type Response = Vec<serde_json::Value>;
    fn command() -> Command {
        Command::SearchRecords
    }
}

/// Fetch one record by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRecord {
    pub module: String,
    pub id: String,
}

impl CrmCommand for GetRecord {
    type Response = Option<serde_json::Value>;
    fn command() -> Command {
        Command::GetRecord
    }
}

/// Insert a record. `trigger` lists the automations to run (e.g. "workflow").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRecord {
    pub module: String,
    pub data: serde_json::Value,
    #[serde(default)]
    pub trigger: Vec<String>,
}

impl CrmCommand for InsertRecord {
    type Response = RecordStatus;
    fn command() -> Command {
        Command::InsertRecord
    }
}

/// Update a record in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub module: String,
    pub id: String,
    pub data: serde_json::Value,
    #[serde(default)]
    pub trigger: Vec<String>,
}

impl CrmCommand for UpdateRecord {
    type Response = RecordStatus;
    fn command() -> Command {
        Command::UpdateRecord
    }
}

/// Delete a record by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRecord {
    pub module: String,
    pub id: String,
}

impl CrmCommand for DeleteRecord {
    type Response = RecordStatus;
    fn command() -> Command {
        Command::DeleteRecord
    }
}

/// Read an organization-scoped variable. `None` when it does not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrgVariable {
    pub name: String,
}

impl CrmCommand for GetOrgVariable {
    type Response = Option<String>;
    fn command() -> Command {
        Command::GetOrgVariable
    }
}

/// Write an organization-scoped variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOrgVariable {
    pub name: String,
    pub value: String,
}

impl CrmCommand for SetOrgVariable {
    type Response = ();
    fn command() -> Command {
        Command::SetOrgVariable
    }
}

/// List every user of the organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsers {}

impl CrmCommand for ListUsers {
    type Response = Vec<User>;
    fn command() -> Command {
        Command::ListUsers
    }
}

/// The user the provider is authenticated as.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentUser {}

impl CrmCommand for CurrentUser {
    type Response = Option<User>;
    fn command() -> Command {
        Command::CurrentUser
    }
}
