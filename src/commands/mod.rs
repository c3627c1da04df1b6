pub mod clear;
pub mod colors;
pub mod config;
pub mod edit;
pub mod events;
pub mod lookup;
pub mod new;

use activity_core::crm::Provider;
use activity_core::{Board, BoardConfig, BoardResult};
use anyhow::Result;

use crate::render::print_notices;
use crate::utils::tui::while_spinning;

/// Load the config, start the provider and look up the logged-in user.
pub async fn open_board() -> Result<Board<Provider>> {
    let config = BoardConfig::load()?;
    tracing::debug!(provider = %config.provider, timezone = %config.timezone, "opening board");
    let provider = Provider::from_name(&config.provider);
    let mut board = Board::new(provider, config)?;

    let message = format!("Connecting to {}", board.config().provider);
    let connected = while_spinning(message, board.connect()).await;

    finish(&mut board, connected)?;
    Ok(board)
}

/// Print the board's notices, then hand back the result.
pub fn finish<T>(board: &mut Board<Provider>, result: BoardResult<T>) -> Result<T> {
    print_notices(&board.take_notices());
    Ok(result?)
}
