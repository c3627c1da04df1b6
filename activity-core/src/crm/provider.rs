//! Provider subprocess transport.
//!
//! The board reaches the CRM through an external provider binary
//! (e.g. `activity-provider-zoho`) using JSON over stdin/stdout: one request
//! line in, one response line out. Providers own their credentials; the
//! board only knows the provider's name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command as TokioCommand};
use tokio::time::timeout;

use crate::crm::protocol::{
    Command, CrmCommand, CurrentUser, DeleteRecord, GetOrgVariable, GetRecord, InsertRecord,
    ListRecords, ListUsers, Request, Response, SearchRecords, SetOrgVariable, UpdateRecord,
};
use crate::crm::{Crm, RecordPage, RecordStatus};
use crate::error::{BoardError, BoardResult};
use crate::record::User;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    fn binary_path(&self) -> BoardResult<PathBuf> {
        let binary_name = format!("activity-provider-{}", self.0);
        which::which(&binary_name).map_err(|_| {
            BoardError::ProviderNotInstalled(format!(
                "Provider '{}' not found. Install it with:\n  cargo install {}",
                self.0, binary_name
            ))
        })
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: CrmCommand>(&self, cmd: C) -> BoardResult<C::Response> {
        tracing::debug!(provider = %self.0, command = ?C::command(), "provider call");

        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| BoardError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> BoardResult<R> {
        let params = serde_json::to_value(params)?;
        let request_json = serde_json::to_string(&Request { command, params })?;

        let binary_path = self.binary_path()?;

        let mut child = spawn(&binary_path)?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| BoardError::Transport("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(BoardError::Transport(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(BoardError::Transport("Provider returned no response".into()));
        }

        let response: Response<R> = serde_json::from_str(&response_str)
            .map_err(|e| BoardError::Transport(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(BoardError::Transport(error)),
        }
    }
}

/// Start a provider process. It is killed if the call is abandoned, e.g. on
/// timeout.
fn spawn(binary_path: &Path) -> BoardResult<Child> {
    TokioCommand::new(binary_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            BoardError::Transport(format!("Failed to spawn {}: {}", binary_path.display(), e))
        })
}

#[async_trait]
impl Crm for Provider {
    async fn list_records(&self, cmd: ListRecords) -> BoardResult<RecordPage> {
        self.call(cmd).await
    }

    async fn search_records(&self, cmd: SearchRecords) -> BoardResult<Vec<serde_json::Value>> {
        self.call(cmd).await
    }

    async fn get_record(&self, cmd: GetRecord) -> BoardResult<Option<serde_json::Value>> {
        self.call(cmd).await
    }

    async fn insert_record(&self, cmd: InsertRecord) -> BoardResult<RecordStatus> {
        self.call(cmd).await
    }

    async fn update_record(&self, cmd: UpdateRecord) -> BoardResult<RecordStatus> {
        self.call(cmd).await
    }

    async fn delete_record(&self, cmd: DeleteRecord) -> BoardResult<RecordStatus> {
        self.call(cmd).await
    }

    async fn get_org_variable(&self, cmd: GetOrgVariable) -> BoardResult<Option<String>> {
        self.call(cmd).await
    }

    async fn set_org_variable(&self, cmd: SetOrgVariable) -> BoardResult<()> {
        self.call(cmd).await
    }

    async fn list_users(&self) -> BoardResult<Vec<User>> {
        self.call(ListUsers {}).await
    }

    async fn current_user(&self) -> BoardResult<Option<User>> {
        self.call(CurrentUser {}).await
    }
}
