//! App-level configuration for the Zoho provider.
//!
//! User-provided OAuth client and refresh token stored at:
//!   ~/.config/activity-board/providers/zoho/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_api_domain() -> String {
    "https://www.zohoapis.com".to_string()
}

fn default_accounts_domain() -> String {
    "https://accounts.zoho.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Data-centre specific API host, e.g. https://www.zohoapis.com.au
    #[serde(default = "default_api_domain")]
    pub api_domain: String,
    #[serde(default = "default_accounts_domain")]
    pub accounts_domain: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("activity-board")
        .join("providers")
        .join("zoho"))
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let path = base_dir()?.join("config.toml");

        if !path.exists() {
            anyhow::bail!(
                "Zoho credentials not found.\n\n\
                Create {} with:\n\n\
                api_domain = \"https://www.zohoapis.com\"\n\
                accounts_domain = \"https://accounts.zoho.com\"\n\
                client_id = \"your-client-id\"\n\
                client_secret = \"your-client-secret\"\n\
                refresh_token = \"your-refresh-token\"",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
