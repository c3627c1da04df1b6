use activity_core::filter::FilterState;
use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::{finish, open_board};
use crate::render::render_table;
use crate::utils::tui::while_spinning;

pub async fn run(filter: FilterState, details: bool) -> Result<()> {
    let mut board = open_board().await?;

    let date = filter.date;
    *board.filter_mut() = filter;

    let message = format!("Loading {}", date.label().to_lowercase());
    let loaded = while_spinning(message, board.select_date(date)).await;
    finish(&mut board, loaded)?;

    let rows = board.rows();
    tracing::debug!(shown = rows.len(), loaded = board.events().len(), "filtered");
    println!("{}", render_table(&rows, details));

    let total = board.events().len();
    if rows.len() != total {
        println!(
            "\n{}",
            format!("{} of {} activities ({})", rows.len(), total, date).dimmed()
        );
    }

    Ok(())
}
