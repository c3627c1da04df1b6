use activity_core::crm::protocol::ListRecords;
use activity_core::crm::{RecordPage, SortOrder};
use anyhow::Result;

use crate::zoho::{ZohoClient, record_page};

pub async fn handle(cmd: ListRecords) -> Result<RecordPage> {
    let client = ZohoClient::connect().await?;

    let sort_order = match cmd.sort_order {
        SortOrder::Asc => "asc",
        SortOrder::Desc => "desc",
    };
    let url = client.url(
        &cmd.module,
        &[
            ("page", cmd.page.to_string()),
            ("per_page", cmd.per_page.to_string()),
            ("sort_order", sort_order.to_string()),
        ],
    )?;

    let page = record_page(client.get(url).await?);
    tracing::debug!(module = %cmd.module, records = page.data.len(), "listed");
    Ok(page)
}
