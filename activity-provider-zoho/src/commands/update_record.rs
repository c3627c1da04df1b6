use activity_core::crm::RecordStatus;
use activity_core::crm::protocol::UpdateRecord;
use anyhow::Result;
use reqwest::Method;
use serde_json::json;

use crate::zoho::{ZohoClient, first_status};

pub async fn handle(cmd: UpdateRecord) -> Result<RecordStatus> {
    let client = ZohoClient::connect().await?;
    let url = client.url(&format!("{}/{}", cmd.module, cmd.id), &[])?;

    let body = json!({ "data": [cmd.data], "trigger": cmd.trigger });
    let status = first_status(client.send(Method::PUT, url, Some(&body)).await?)?;

    tracing::debug!(module = %cmd.module, id = %cmd.id, code = %status.code, "updated");
    Ok(status)
}
