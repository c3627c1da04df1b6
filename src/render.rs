//! Terminal rendering for board types.
//!
//! Extension traits adding colored output to activity-core types using
//! owo_colors.

use activity_core::row::DisplayRow;
use activity_core::{Notice, Severity};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Notice {
    fn render(&self) -> String {
        match self.severity {
            Severity::Success => format!("{} {}", "✓".green(), self.message.green()),
            Severity::Warning => format!("{} {}", "!".yellow(), self.message.yellow()),
            Severity::Error => format!("{} {}", "✗".red(), self.message.red()),
        }
    }
}

impl Render for DisplayRow {
    fn render(&self) -> String {
        let title = if self.is_closed() {
            self.title.strikethrough().dimmed().to_string()
        } else {
            self.title.clone()
        };

        format!(
            "  {} {} {} {} {} {}",
            swatch(&self.color),
            self.time,
            render_priority(&self.priority),
            title,
            format!("[{}]", self.activity_type).dimmed(),
            self.id.dimmed(),
        )
    }
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        match notice.severity {
            Severity::Error => eprintln!("{}", notice.render()),
            _ => println!("{}", notice.render()),
        }
    }
}

/// The activity table, grouped by date (rows arrive date-descending).
pub fn render_table(rows: &[DisplayRow], details: bool) -> String {
    if rows.is_empty() {
        return "No activities found".dimmed().to_string();
    }

    let mut lines = Vec::new();
    let mut current_date = None;

    for row in rows {
        if current_date != Some(row.date) {
            if current_date.is_some() {
                lines.push(String::new());
            }
            lines.push(row.formatted_date().bold().to_string());
            current_date = Some(row.date);
        }

        lines.push(row.render());
        if details {
            lines.extend(render_details(row).into_iter().map(|l| format!("        {l}")));
        }
    }

    lines.join("\n")
}

fn render_details(row: &DisplayRow) -> Vec<String> {
    vec![
        format!("{}: {}", "with".dimmed(), row.participant_names()),
        format!("{}: {}", "for".dimmed(), row.scheduled_for),
        format!("{}: {}", "account".dimmed(), row.associate_with),
        format!("{}: {}", "duration".dimmed(), row.duration),
        format!("{}: {}", "regarding".dimmed(), row.regarding),
    ]
}

fn render_priority(priority: &str) -> String {
    let padded = format!("{priority:<6}");
    match priority {
        "High" => padded.red().to_string(),
        "Medium" => padded.yellow().to_string(),
        _ => padded.dimmed().to_string(),
    }
}

/// A colored dot for `#rrggbb`; anything else renders uncolored.
pub fn swatch(color: &str) -> String {
    match parse_hex(color) {
        Some((r, g, b)) => "●".truecolor(r, g, b).to_string(),
        _ => "●".to_string(),
    }
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
