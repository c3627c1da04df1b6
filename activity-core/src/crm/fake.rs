//! In-memory CRM used by the unit tests. Records every call it receives.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::crm::{
    Crm, DeleteRecord, GetOrgVariable, GetRecord, InsertRecord, ListRecords, RecordPage,
    RecordStatus, SUCCESS_CODE, SearchRecords, SetOrgVariable, UpdateRecord,
};
use crate::error::{BoardError, BoardResult};
use crate::record::User;

#[derive(Default)]
pub(crate) struct FakeState {
    pub search_results: Vec<Value>,
    /// Pages returned by `list_records`, by page number starting at 1.
    pub pages: Vec<RecordPage>,
    pub records: HashMap<String, Value>,
    pub users: Vec<User>,
    pub current_user: Option<User>,
    pub org_variables: HashMap<String, String>,
    /// Method names that fail at the transport level.
    pub fail: HashSet<&'static str>,
    /// Modules whose writes come back with a non-SUCCESS code.
    pub reject_modules: HashSet<String>,
    /// Writes whose payload looks up one of these record ids are rejected.
    pub reject_refs: HashSet<String>,
    pub calls: Vec<String>,
    pub inserted: Vec<(String, Value)>,
    pub updated: Vec<(String, String, Value)>,
    pub deleted: Vec<(String, String)>,
    next_id: u64,
}

#[derive(Default)]
pub(crate) struct FakeCrm {
    state: Mutex<FakeState>,
}

impl FakeCrm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    fn enter(&self, method: &'static str, detail: &str) -> BoardResult<()> {
        self.with(|s| {
            s.calls.push(format!("{method}:{detail}"));
            if s.fail.contains(method) {
                Err(BoardError::Transport(format!("{method} failed")))
            } else {
                Ok(())
            }
        })
    }

    fn write_status(&self, module: &str, id: String, data: &Value) -> RecordStatus {
        self.with(|s| {
            let refs_rejected = data.as_object().is_some_and(|fields| {
                fields
                    .values()
                    .filter_map(|v| v.get("id").and_then(Value::as_str))
                    .any(|id| s.reject_refs.contains(id))
            });
            if s.reject_modules.contains(module) || refs_rejected {
                RecordStatus {
                    code: "INVALID_DATA".into(),
                    message: "invalid data".into(),
                    details: Default::default(),
                }
            } else {
                let mut details = serde_json::Map::new();
                details.insert("id".into(), Value::String(id));
                RecordStatus {
                    code: SUCCESS_CODE.into(),
                    message: "ok".into(),
                    details,
                }
            }
        })
    }
}

#[async_trait]
impl Crm for FakeCrm {
    async fn list_records(&self, cmd: ListRecords) -> BoardResult<RecordPage> {
        self.enter("list_records", &format!("{}#{}", cmd.module, cmd.page))?;
        Ok(self.with(|s| {
            s.pages
                .get(cmd.page.saturating_sub(1) as usize)
                .cloned()
                .unwrap_or_default()
        }))
    }

    async fn search_records(&self, cmd: SearchRecords) -> BoardResult<Vec<Value>> {
        self.enter("search_records", &cmd.module)?;
        Ok(self.with(|s| s.search_results.clone()))
    }

    async fn get_record(&self, cmd: GetRecord) -> BoardResult<Option<Value>> {
        self.enter("get_record", &cmd.id)?;
        Ok(self.with(|s| s.records.get(&cmd.id).cloned()))
    }

    async fn insert_record(&self, cmd: InsertRecord) -> BoardResult<RecordStatus> {
        self.enter("insert_record", &cmd.module)?;
        let id = self.with(|s| {
            s.next_id += 1;
            s.inserted.push((cmd.module.clone(), cmd.data.clone()));
            format!("new-{}", s.next_id)
        });
        Ok(self.write_status(&cmd.module, id, &cmd.data))
    }

    async fn update_record(&self, cmd: UpdateRecord) -> BoardResult<RecordStatus> {
        self.enter("update_record", &cmd.module)?;
        self.with(|s| {
            s.updated
                .push((cmd.module.clone(), cmd.id.clone(), cmd.data.clone()))
        });
        Ok(self.write_status(&cmd.module, cmd.id, &cmd.data))
    }

    async fn delete_record(&self, cmd: DeleteRecord) -> BoardResult<RecordStatus> {
        self.enter("delete_record", &cmd.module)?;
        self.with(|s| s.deleted.push((cmd.module.clone(), cmd.id.clone())));
        Ok(self.write_status(&cmd.module, cmd.id, &Value::Null))
    }

    async fn get_org_variable(&self, cmd: GetOrgVariable) -> BoardResult<Option<String>> {
        self.enter("get_org_variable", &cmd.name)?;
        Ok(self.with(|s| s.org_variables.get(&cmd.name).cloned()))
    }

    async fn set_org_variable(&self, cmd: SetOrgVariable) -> BoardResult<()> {
        self.enter("set_org_variable", &cmd.name)?;
        self.with(|s| s.org_variables.insert(cmd.name, cmd.value));
        Ok(())
    }

    async fn list_users(&self) -> BoardResult<Vec<User>> {
        self.enter("list_users", "")?;
        Ok(self.with(|s| s.users.clone()))
    }

    async fn current_user(&self) -> BoardResult<Option<User>> {
        self.enter("current_user", "")?;
        Ok(self.with(|s| s.current_user.clone()))
    }
}
