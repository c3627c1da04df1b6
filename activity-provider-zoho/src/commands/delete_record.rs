use activity_core::crm::RecordStatus;
use activity_core::crm::protocol::DeleteRecord;
use anyhow::Result;
use reqwest::Method;

use crate::zoho::{ZohoClient, first_status};

pub async fn handle(cmd: DeleteRecord) -> Result<RecordStatus> {
    let client = ZohoClient::connect().await?;
    let url = client.url(&cmd.module, &[("ids", cmd.id.clone())])?;

    let status = first_status(client.send(Method::DELETE, url, None).await?)?;

    tracing::debug!(module = %cmd.module, id = %cmd.id, code = %status.code, "deleted");
    Ok(status)
}
