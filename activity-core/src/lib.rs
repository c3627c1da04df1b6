//! Core of the activity board.
//!
//! - [`record`]: vendor-shaped CRM records
//! - [`reconcile`], [`row`], [`filter`]: from raw records to the displayed table
//! - [`draft`], [`clear`], [`gateway`]: writing changes back to the CRM
//! - [`board`]: the state a host drives
//! - [`crm`]: the CRM seam and the provider protocol

pub mod board;
pub mod clear;
pub mod colors;
pub mod config;
pub mod crm;
pub mod date_range;
pub mod draft;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod gateway;
pub mod lookup;
pub mod reconcile;
pub mod record;
pub mod row;

pub use board::{Board, FetchOutcome, Notice, PageContext, Severity};
pub use config::BoardConfig;
pub use date_range::DateFilter;
pub use error::{BoardError, BoardResult};
