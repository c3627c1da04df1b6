use activity_core::colors::PALETTE;
use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::{finish, open_board};
use crate::render::swatch;
use crate::utils::tui::while_spinning;

const PER_LINE: usize = 6;

pub async fn run() -> Result<()> {
    let mut board = open_board().await?;

    // Recent colors arrive with the activity fetch.
    let loaded = while_spinning("Loading recent colors", board.fetch()).await;
    finish(&mut board, loaded)?;

    println!("{}", "Palette".bold());
    for line in PALETTE.chunks(PER_LINE) {
        println!("  {}", render_colors(line.iter().copied()));
    }

    println!();
    println!("{}", "Recent".bold());
    let recent = board.recent_colors();
    if recent.is_empty() {
        println!("  {}", "None yet".dimmed());
    } else {
        println!("  {}", render_colors(recent.as_slice().iter().map(String::as_str)));
    }

    Ok(())
}

fn render_colors<'a>(colors: impl Iterator<Item = &'a str>) -> String {
    colors
        .map(|c| format!("{} {}", swatch(c), c.dimmed()))
        .collect::<Vec<_>>()
        .join("  ")
}
