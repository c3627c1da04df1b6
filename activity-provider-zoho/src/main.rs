//! activity-provider-zoho - Zoho CRM provider for activity-board
//!
//! This binary implements the activity-board provider protocol,
//! communicating with the board via JSON over stdin/stdout.
//!
//! The provider manages its own credentials and access token:
//!   ~/.config/activity-board/providers/zoho/config.toml
//!   ~/.config/activity-board/providers/zoho/session.toml

mod app_config;
mod commands;
mod session;
mod zoho;

use std::future::Future;
use std::io::{self, BufRead, Write};

use activity_core::crm::protocol::{Command, CurrentUser, ListUsers, Request, Response};
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .without_time()
        .init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "failed to read stdin");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request).await,
            Err(e) => Response::error(&format!("Failed to parse request: {}", e)),
        };

        if let Err(e) = writeln!(stdout, "{}", response).and_then(|_| stdout.flush()) {
            tracing::error!(error = %e, "failed to write response");
            break;
        }
    }
}

async fn handle_request(request: Request) -> String {
    use commands::*;

    let params = request.params;
    match request.command {
        Command::ListRecords => respond(params, list_records::handle).await,
        Command::SearchRecords => respond(params, search_records::handle).await,
        Command::GetRecord => respond(params, get_record::handle).await,
        Command::InsertRecord => respond(params, insert_record::handle).await,
        Command::UpdateRecord => respond(params, update_record::handle).await,
        Command::DeleteRecord => respond(params, delete_record::handle).await,
        Command::GetOrgVariable => respond(params, org_variables::get).await,
        Command::SetOrgVariable => respond(params, org_variables::set).await,
        Command::ListUsers => respond(params, |_: ListUsers| users::list()).await,
        Command::CurrentUser => respond(params, |_: CurrentUser| users::current()).await,
    }
}

/// Decode the params, run the handler and encode its result.
async fn respond<P, T, F, Fut>(params: serde_json::Value, handler: F) -> String
where
    P: DeserializeOwned,
    T: Serialize,
    F: FnOnce(P) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let params = if params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        params
    };

    let cmd: P = match serde_json::from_value(params) {
        Ok(cmd) => cmd,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    match handler(cmd).await {
        Ok(data) => Response::success(data),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "command failed");
            Response::error(&format!("{:#}", e))
        }
    }
}
