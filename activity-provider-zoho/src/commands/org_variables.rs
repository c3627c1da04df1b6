//! Organization variables (`/settings/variables`), matched by API name.

use activity_core::crm::protocol::{GetOrgVariable, SetOrgVariable};
use anyhow::Result;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::zoho::{ZohoClient, first_status};

#[derive(Debug, Deserialize)]
struct Variable {
    id: String,
    api_name: String,
    #[serde(default)]
    value: Option<Value>,
}

pub async fn get(cmd: GetOrgVariable) -> Result<Option<String>> {
    let client = ZohoClient::connect().await?;
    let variables = list(&client).await?;

    Ok(find(&variables, &cmd.name).and_then(|v| value_text(v.value.as_ref())))
}

pub async fn set(cmd: SetOrgVariable) -> Result<()> {
    let client = ZohoClient::connect().await?;
    let variables = list(&client).await?;

    let Some(variable) = find(&variables, &cmd.name) else {
        anyhow::bail!("Org variable '{}' does not exist in Zoho CRM", cmd.name);
    };

    let url = client.url("settings/variables", &[])?;
    let body = json!({ "variables": [{ "id": variable.id, "value": cmd.value }] });
    let response = client.send(Method::PUT, url, Some(&body)).await?;

    // Same per-entry status shape as record writes, under "variables".
    let status = match response.get("variables") {
        Some(entries) => first_status(json!({ "data": entries }))?,
        None => first_status(response)?,
    };
    if !status.is_success() {
        anyhow::bail!("Could not update '{}': {}", cmd.name, status.message);
    }
    Ok(())
}

async fn list(client: &ZohoClient) -> Result<Vec<Variable>> {
    let url = client.url("settings/variables", &[])?;
    let Some(body) = client.get(url).await? else {
        return Ok(Vec::new());
    };
    parse_variables(body)
}

fn parse_variables(mut body: Value) -> Result<Vec<Variable>> {
    match body.get_mut("variables").map(Value::take) {
        Some(list) => Ok(serde_json::from_value(list)?),
        None => Ok(Vec::new()),
    }
}

fn find<'a>(variables: &'a [Variable], name: &str) -> Option<&'a Variable> {
    variables.iter().find(|v| v.api_name == name)
}

/// Variables are typed; the board only stores text in them.
fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
