//! Event colors: the fixed picker palette and the org-wide recent list.

use serde::{Deserialize, Serialize};

/// How many recent colors are remembered.
pub const RECENT_LIMIT: usize = 8;

/// The basic colors grid, in display order (eight per row).
pub const PALETTE: [&str; 36] = [
    "#ff0000", "#ff9900", "#ffff00", "#00ff00", "#00ffff", "#0000ff", "#9900ff", "#ff00ff",
    "#ff9999", "#ffcc99", "#ffff99", "#ccff99", "#99ffcc", "#99ccff", "#cc99ff", "#ff99ff",
    "#660000", "#996633", "#669933", "#336600", "#006666", "#003366", "#660066", "#660033",
    "#cc0000", "#cc6600", "#cccc00", "#66cc00", "#00cccc", "#0066cc", "#6600cc", "#cc00cc",
    "#999999", "#cccccc", "#333333", "#666666",
];

/// `#rrggbb`
pub fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Recently used colors, most recent first.
///
/// Stored in an org variable as a JSON array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentColors(Vec<String>);

impl RecentColors {
    /// Read the org variable's value. A missing or malformed value is an
    /// empty list; entries that are not colors are dropped.
    pub fn from_variable(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };

        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(colors) => {
                let mut recent = Self::default();
                for color in colors.into_iter().rev() {
                    recent.push(&color);
                }
                recent
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed recent colors");
                Self::default()
            }
        }
    }

    pub fn to_variable(&self) -> String {
        serde_json::Value::from(self.0.clone()).to_string()
    }

    /// Move `color` to the front. Returns whether the list changed.
    pub fn push(&mut self, color: &str) -> bool {
        let color = color.to_ascii_lowercase();
        if !is_hex_color(&color) || self.0.first() == Some(&color) {
            return false;
        }
        self.0.retain(|c| *c != color);
        self.0.insert(0, color);
        self.0.truncate(RECENT_LIMIT);
        true
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_entries_are_colors() {
        assert!(PALETTE.iter().all(|c| is_hex_color(c)));
        assert!(!is_hex_color("red"));
        assert!(!is_hex_color("#12345g"));
    }

    #[test]
    fn push_dedups_and_caps() {
        let mut recent = RecentColors::default();
        for color in &PALETTE[..10] {
            assert!(recent.push(color));
        }
        assert_eq!(recent.as_slice().len(), RECENT_LIMIT);
        assert_eq!(recent.as_slice()[0], PALETTE[9]);

        assert!(recent.push(PALETTE[5]));
        assert_eq!(recent.as_slice()[0], PALETTE[5]);
        assert_eq!(recent.as_slice().len(), RECENT_LIMIT);
        assert_eq!(
            recent.as_slice().iter().filter(|c| *c == PALETTE[5]).count(),
            1
        );

        assert!(!recent.push(PALETTE[5]));
        assert!(!recent.push("not-a-color"));
    }

    #[test]
    fn reads_and_writes_variable() {
        let recent = RecentColors::from_variable(Some(r##"["#FF0000","#00ff00","#ff0000","junk"]"##));
        assert_eq!(recent.as_slice(), ["#ff0000", "#00ff00"]);
        assert_eq!(recent.to_variable(), r##"["#ff0000","#00ff00"]"##);
    }

    #[test]
    fn missing_or_malformed_variable_is_empty() {
        assert!(RecentColors::from_variable(None).is_empty());
        assert!(RecentColors::from_variable(Some("")).is_empty());
        assert!(RecentColors::from_variable(Some("{not json")).is_empty());
    }
}
