use activity_core::record::User;
use anyhow::Result;
use serde_json::Value;

use crate::zoho::ZohoClient;

const PER_PAGE: u32 = 200;

/// Every user in the organization, following `more_records`.
pub async fn list() -> Result<Vec<User>> {
    let client = ZohoClient::connect().await?;

    let mut users = Vec::new();
    let mut page = 1;
    loop {
        let url = client.url(
            "users",
            &[
                ("type", "AllUsers".to_string()),
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
            ],
        )?;
        let Some(body) = client.get(url).await? else {
            break;
        };

        let (batch, more) = parse_users(body)?;
        users.extend(batch);
        if !more {
            break;
        }
        page += 1;
    }

    tracing::debug!(users = users.len(), "listed users");
    Ok(users)
}

/// The user the access token belongs to.
pub async fn current() -> Result<Option<User>> {
    let client = ZohoClient::connect().await?;
    let url = client.url("users", &[("type", "CurrentUser".to_string())])?;

    match client.get(url).await? {
        Some(body) => Ok(parse_users(body)?.0.into_iter().next()),
        None => Ok(None),
    }
}

fn parse_users(mut body: Value) -> Result<(Vec<User>, bool)> {
    let more = body
        .pointer("/info/more_records")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let users = match body.get_mut("users").map(Value::take) {
        Some(list) => serde_json::from_value(list)?,
        None => Vec::new(),
    };
    Ok((users, more))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_user_pages() {
        let (users, more) = parse_users(json!({
            "users": [
                {"id": "1", "full_name": "Ann Lee", "email": "ann@example.com", "role": {"name": "CEO"}},
                {"id": "2", "full_name": "Bo Chen"}
            ],
            "info": {"more_records": true}
        }))
        .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].full_name, "Ann Lee");
        assert_eq!(users[1].email, None);
        assert!(more);

        let (none, more) = parse_users(json!({})).unwrap();
        assert!(none.is_empty());
        assert!(!more);
    }
}
