//! Thin client for the Zoho CRM REST API (v2).

use activity_core::crm::{RecordPage, RecordStatus};
use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::app_config::AppConfig;
use crate::session::Session;

pub struct ZohoClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl ZohoClient {
    /// Load the config and a valid access token.
    pub async fn connect() -> Result<Self> {
        let app = AppConfig::load()?;
        let session = Session::load_valid(&app).await?;
        Self::new(&app.api_domain, session.access_token())
    }

    pub fn new(api_domain: &str, token: &str) -> Result<Self> {
        let base = Url::parse(api_domain)
            .and_then(|domain| domain.join("/crm/v2/"))
            .with_context(|| format!("Invalid api_domain: {}", api_domain))?;

        Ok(ZohoClient {
            http: reqwest::Client::new(),
            base,
            token: token.to_string(),
        })
    }

    /// `path` is relative to `/crm/v2/`, e.g. `Events/search`.
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base
            .join(path)
            .with_context(|| format!("Invalid API path: {}", path))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET a resource. `None` when Zoho answers 204 (nothing found).
    pub async fn get(&self, url: Url) -> Result<Option<Value>> {
        tracing::debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .context("Failed to reach Zoho CRM")?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            anyhow::bail!(api_error(status, &body));
        }
        Ok(Some(body))
    }

    /// POST, PUT or DELETE. Per-record failures come back in the body with
    /// a non-2xx status, so any JSON body is handed back as is.
    pub async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        tracing::debug!(%method, %url, "write");
        let mut request = self
            .http
            .request(method, url)
            .header("Authorization", self.auth_header());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.context("Failed to reach Zoho CRM")?;
        let status = response.status();

        match response.json::<Value>().await {
            Ok(body) => Ok(body),
            Err(_) if status.is_success() => Ok(Value::Null),
            Err(_) => anyhow::bail!("Zoho CRM returned HTTP {}", status),
        }
    }

    fn auth_header(&self) -> String {
        format!("Zoho-oauthtoken {}", self.token)
    }
}

/// Error message from a Zoho error body, falling back to the HTTP status.
fn api_error(status: StatusCode, body: &Value) -> String {
    let code = body.get("code").and_then(Value::as_str);
    let message = body.get("message").and_then(Value::as_str);
    match (code, message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (_, Some(message)) => message.to_string(),
        _ => format!("Zoho CRM returned HTTP {status}"),
    }
}

/// A listing or search body: `{"data": [...], "info": {"more_records": ..}}`.
pub fn record_page(body: Option<Value>) -> RecordPage {
    let Some(mut body) = body else {
        return RecordPage::default();
    };

    let more_records = body
        .pointer("/info/more_records")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let data = match body.get_mut("data").map(Value::take) {
        Some(Value::Array(records)) => records,
        _ => Vec::new(),
    };

    RecordPage { data, more_records }
}

/// The status of the single record a write touched.
///
/// Errors for the whole request (bad token, missing mandatory field) come
/// back at the top level instead of under `data`; they are read the same way.
pub fn first_status(body: Value) -> Result<RecordStatus> {
    let status = match body.pointer("/data/0") {
        Some(first) => first.clone(),
        None if body.get("code").is_some() => body,
        None => anyhow::bail!("Unexpected response from Zoho CRM: {}", body),
    };
    serde_json::from_value(status).context("Failed to parse record status")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_urls_under_the_api_root() {
        let client = ZohoClient::new("https://www.zohoapis.com.au", "t").unwrap();
        let url = client
            .url("Events/search", &[("criteria", "(Owner:equals:1)".into())])
            .unwrap();
        assert_eq!(url.path(), "/crm/v2/Events/search");
        assert_eq!(
            url.query_pairs().next().map(|(k, v)| (k.into_owned(), v.into_owned())),
            Some(("criteria".into(), "(Owner:equals:1)".into()))
        );
    }

    #[test]
    fn parses_pages() {
        let page = record_page(Some(json!({
            "data": [{"id": "1"}, {"id": "2"}],
            "info": {"more_records": true, "page": 1}
        })));
        assert_eq!(page.data.len(), 2);
        assert!(page.more_records);

        let empty = record_page(None);
        assert!(empty.data.is_empty());
        assert!(!empty.more_records);
    }

    #[test]
    fn reads_record_status_from_data_or_top_level() {
        let ok = first_status(json!({
            "data": [{
                "code": "SUCCESS",
                "details": {"id": "5001"},
                "message": "record added",
                "status": "success"
            }]
        }))
        .unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.record_id(), Some("5001"));

        let rejected = first_status(json!({
            "code": "INVALID_TOKEN",
            "message": "invalid oauth token",
            "status": "error"
        }))
        .unwrap();
        assert!(!rejected.is_success());
        assert_eq!(rejected.message, "invalid oauth token");

        assert!(first_status(json!({"unexpected": true})).is_err());
    }

    #[test]
    fn error_messages_prefer_the_body() {
        let body = json!({"code": "NO_PERMISSION", "message": "permission denied"});
        assert_eq!(
            api_error(StatusCode::FORBIDDEN, &body),
            "NO_PERMISSION: permission denied"
        );
        assert_eq!(
            api_error(StatusCode::BAD_GATEWAY, &Value::Null),
            "Zoho CRM returned HTTP 502 Bad Gateway"
        );
    }
}
