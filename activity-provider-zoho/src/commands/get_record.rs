use activity_core::crm::protocol::GetRecord;
use anyhow::Result;

use crate::zoho::{ZohoClient, record_page};

pub async fn handle(cmd: GetRecord) -> Result<Option<serde_json::Value>> {
    let client = ZohoClient::connect().await?;
    let url = client.url(&format!("{}/{}", cmd.module, cmd.id), &[])?;

    Ok(record_page(client.get(url).await?).data.into_iter().next())
}
