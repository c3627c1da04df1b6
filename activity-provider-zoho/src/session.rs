//! A valid Zoho access token, refreshed from the configured refresh token
//! when missing or expired.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::app_config::{AppConfig, base_dir};

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

pub struct Session {
    data: SessionData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
}

impl SessionData {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

impl Session {
    fn path() -> Result<std::path::PathBuf> {
        Ok(base_dir()?.join("session.toml"))
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    /// Load the cached session, refreshing it if it is missing or expired.
    pub async fn load_valid(app: &AppConfig) -> Result<Self> {
        match Self::load()? {
            Some(data) if !data.is_expired(Utc::now()) => Ok(Session { data }),
            _ => Self::refresh(app).await,
        }
    }

    fn load() -> Result<Option<SessionData>> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read Zoho session from {}", path.display()))?;

        match toml::from_str(&contents) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    async fn refresh(app: &AppConfig) -> Result<Self> {
        tracing::debug!("refreshing Zoho access token");

        let url = format!("{}/oauth/v2/token", app.accounts_domain.trim_end_matches('/'));
        let response = reqwest::Client::new()
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", app.client_id.as_str()),
                ("client_secret", app.client_secret.as_str()),
                ("refresh_token", app.refresh_token.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach the Zoho accounts server")?;

        let status = response.status();
        let body: RefreshResponse = response
            .json()
            .await
            .context("Failed to parse token refresh response")?;

        // Zoho reports refresh failures in the body, often with a 200.
        let access_token = match (body.access_token, body.error) {
            (Some(token), None) if status.is_success() => token,
            (_, Some(error)) => anyhow::bail!("Token refresh failed: {}", error),
            _ => anyhow::bail!("Token refresh failed with HTTP {}", status),
        };

        let data = SessionData {
            access_token,
            expires_at: Utc::now() + Duration::seconds(body.expires_in.unwrap_or(3600)),
        };
        let session = Session { data };
        session.save()?;
        Ok(session)
    }

    fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.data).context("Failed to serialize session")?;

        let path = Self::path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write session to {}", path.display()))?;

        // Set to owner-only (0600) since file contains an access token:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(expires_at: DateTime<Utc>) -> SessionData {
        SessionData {
            access_token: "token".into(),
            expires_at,
        }
    }

    #[test]
    fn expires_shortly_before_the_deadline() {
        let now = Utc::now();
        assert!(!data(now + Duration::minutes(30)).is_expired(now));
        assert!(data(now + Duration::seconds(30)).is_expired(now));
        assert!(data(now - Duration::minutes(1)).is_expired(now));
    }

    #[test]
    fn session_round_trips_through_toml() {
        let original = data(Utc::now());
        let parsed: SessionData = toml::from_str(&toml::to_string_pretty(&original).unwrap()).unwrap();
        assert_eq!(parsed, original);
    }
}
