use activity_core::crm::SearchQuery;
use activity_core::crm::protocol::SearchRecords;
use anyhow::Result;

use crate::zoho::{ZohoClient, record_page};

pub async fn handle(cmd: SearchRecords) -> Result<Vec<serde_json::Value>> {
    let client = ZohoClient::connect().await?;

    let query = match cmd.query {
        SearchQuery::Criteria(criteria) => ("criteria", criteria),
        SearchQuery::Word(word) => ("word", word),
    };
    let url = client.url(&format!("{}/search", cmd.module), &[query])?;

    // Zoho answers an empty search with 204.
    Ok(record_page(client.get(url).await?).data)
}
