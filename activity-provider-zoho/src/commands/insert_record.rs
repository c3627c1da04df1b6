use activity_core::crm::RecordStatus;
use activity_core::crm::protocol::InsertRecord;
use anyhow::Result;
use reqwest::Method;
use serde_json::json;

use crate::zoho::{ZohoClient, first_status};

pub async fn handle(cmd: InsertRecord) -> Result<RecordStatus> {
    let client = ZohoClient::connect().await?;
    let url = client.url(&cmd.module, &[])?;

    let body = json!({ "data": [cmd.data], "trigger": cmd.trigger });
    let status = first_status(client.send(Method::POST, url, Some(&body)).await?)?;

    tracing::debug!(module = %cmd.module, code = %status.code, "inserted");
    Ok(status)
}
