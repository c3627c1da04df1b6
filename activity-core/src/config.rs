//! Board configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

static DEFAULT_PROVIDER: &str = "zoho";
static DEFAULT_TIMEZONE: &str = "Australia/Sydney";
static DEFAULT_RECENT_COLORS_VARIABLE: &str = "recent_colors";

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_all_since() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn default_page_size() -> u32 {
    100
}

fn default_listing_pages() -> u32 {
    1
}

fn default_recent_colors_variable() -> String {
    DEFAULT_RECENT_COLORS_VARIABLE.to_string()
}

/// Configuration at ~/.config/activity-board/config.toml
///
/// Provider credentials are not stored here; each provider keeps its own
/// under ~/.config/activity-board/providers/<name>/.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Provider binary suffix (`activity-provider-<provider>`).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// IANA zone used for display and for timestamps sent to the CRM.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// First day fetched by the "Default" date filter.
    #[serde(default = "default_all_since")]
    pub all_since: NaiveDate,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// How many pages of the full listing to merge with the search results.
    #[serde(default = "default_listing_pages")]
    pub listing_pages: u32,

    #[serde(default = "default_recent_colors_variable")]
    pub recent_colors_variable: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            provider: default_provider(),
            timezone: default_timezone(),
            all_since: default_all_since(),
            page_size: default_page_size(),
            listing_pages: default_listing_pages(),
            recent_colors_variable: default_recent_colors_variable(),
        }
    }
}

impl BoardConfig {
    pub fn config_path() -> BoardResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BoardError::Config("Could not determine config directory".into()))?
            .join("activity-board");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load() -> BoardResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| BoardError::Config(format!("Could not read {}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> BoardResult<Self> {
        let config: BoardConfig =
            toml::from_str(contents).map_err(|e| BoardError::Config(e.to_string()))?;
        config.tz()?;
        Ok(config)
    }

    pub fn tz(&self) -> BoardResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| BoardError::Config(format!("Unknown timezone '{}'", self.timezone)))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> BoardResult<()> {
        let contents = format!(
            "\
# activity-board configuration

# Provider binary to talk to (activity-provider-<name>):
# provider = \"{DEFAULT_PROVIDER}\"

# Timezone for display and for timestamps sent to the CRM:
# timezone = \"{DEFAULT_TIMEZONE}\"

# First day fetched by the default date filter:
# all_since = \"2024-01-01\"

# Records per page, and how many pages of the full listing to fetch:
# page_size = 100
# listing_pages = 1

# Org variable holding recently used colors:
# recent_colors_variable = \"{DEFAULT_RECENT_COLORS_VARIABLE}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BoardError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| BoardError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = BoardConfig::from_toml("").unwrap();
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.provider, "zoho");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.listing_pages, 1);
    }

    #[test]
    fn overrides_are_read() {
        let config = BoardConfig::from_toml(
            r#"
timezone = "Europe/London"
all_since = "2023-06-01"
listing_pages = 3
"#,
        )
        .unwrap();
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::London);
        assert_eq!(config.all_since, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(config.listing_pages, 3);
    }

    #[test]
    fn unknown_timezone_is_a_config_error() {
        let err = BoardConfig::from_toml(r#"timezone = "Mars/Olympus""#).unwrap_err();
        assert!(matches!(err, BoardError::Config(_)));
    }

    #[test]
    fn default_config_file_parses_to_defaults() {
        let dir = std::env::temp_dir().join(format!("activity-board-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        BoardConfig::create_default_config(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(BoardConfig::from_toml(&contents).unwrap(), BoardConfig::default());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
