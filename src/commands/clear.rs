use activity_core::clear::{ClearRequest, RESULTS, duration_label};
use activity_core::row::DisplayRow;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::commands::{finish, open_board};
use crate::render::Render;
use crate::utils::tui::while_spinning;

#[derive(Args)]
pub struct ClearArgs {
    /// Id of the activity
    pub id: String,

    /// Delete the activity instead of marking it cleared
    #[arg(long)]
    pub erase: bool,

    /// Outcome, e.g. "Meeting Held" or "Left Message"
    #[arg(short, long)]
    pub result: Option<String>,

    /// Also write a history record with these details
    #[arg(long, value_name = "DETAILS")]
    pub history: Option<String>,

    /// Erase without asking
    #[arg(short, long)]
    pub force: bool,
}

pub async fn run(args: ClearArgs) -> Result<()> {
    let result = args.result.as_deref().map(known_result).transpose()?;

    let mut board = open_board().await?;

    let opened = while_spinning(format!("Loading {}", args.id), board.open_clear(&args.id)).await;
    let (event, mut choice) = finish(&mut board, opened)?;

    if args.erase {
        choice.set_erase(true);
    } else if choice.clear_checked() && args.history.is_none() {
        println!("{}", "Already cleared".dimmed());
        return Ok(());
    } else {
        choice.set_clear(true);
    }
    let Some(action) = choice.action() else {
        return Ok(());
    };

    let row = DisplayRow::from_event(&event, board.tz(), Utc::now());
    println!("{}", row.render());
    println!(
        "        {}: {}",
        "duration".dimmed(),
        duration_label(event.duration_min.as_deref())
    );

    if args.erase && !args.force {
        let confirmed = Confirm::new()
            .with_prompt("Erase this activity?")
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    let mut request = ClearRequest::new(action);
    if let Some(result) = result {
        request = request.with_result(result);
    }
    if let Some(details) = args.history {
        request = request.with_history(details);
    }

    let saved = while_spinning("Saving", board.clear_or_erase(&event, &request)).await;
    finish(&mut board, saved)?;
    Ok(())
}

/// The CRM only accepts results from its own picklist.
fn known_result(value: &str) -> Result<String> {
    RESULTS
        .iter()
        .find(|r| r.eq_ignore_ascii_case(value.trim()))
        .map(|r| r.to_string())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown result \"{}\". Expected one of: {}",
                value,
                RESULTS.join(", ")
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_come_from_the_picklist() {
        let first = RESULTS[0];
        assert_eq!(known_result(&first.to_uppercase()).unwrap(), first);
        assert!(known_result("Went great").is_err());
    }
}
