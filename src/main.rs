mod commands;
mod input;
mod render;
mod utils;

use activity_core::DateFilter;
use activity_core::filter::FilterState;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "activity")]
#[command(about = "List, filter and manage CRM activities from the terminal")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the activity table
    Events {
        #[command(flatten)]
        filters: FilterArgs,

        /// Show participants, owner, account and duration under each row
        #[arg(long)]
        details: bool,
    },
    /// Create an activity
    New(commands::new::NewArgs),
    /// Edit an existing activity
    Edit(commands::edit::EditArgs),
    /// Clear (close) or erase an activity
    Clear(commands::clear::ClearArgs),
    /// Search contacts
    Contacts {
        query: String,

        /// Match the first name exactly instead of a full-text search
        #[arg(long)]
        first_name: bool,
    },
    /// Search accounts
    Accounts { query: String },
    /// Show the color palette and recently used colors
    Colors,
    /// Show config paths, or create a default config file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Date preset: all, last-7-days, last-30-days, last-90-days,
    /// current-week, current-month, next-week
    #[arg(short, long, default_value = "all", conflicts_with_all = ["from", "to"])]
    date: DateFilter,

    /// Custom range start (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    from: Option<chrono::NaiveDate>,

    /// Custom range end (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    to: Option<chrono::NaiveDate>,

    /// Only these activity types (repeatable)
    #[arg(short = 't', long = "type")]
    types: Vec<String>,

    /// Only these priorities (repeatable)
    #[arg(short, long = "priority")]
    priorities: Vec<String>,

    /// Only activities scheduled for these users (repeatable)
    #[arg(short, long = "user")]
    users: Vec<String>,

    /// Only cleared (closed) activities
    #[arg(long)]
    cleared: bool,
}

impl FilterArgs {
    fn into_filter(self) -> FilterState {
        let date = match (self.from, self.to) {
            (Some(from), Some(to)) => DateFilter::custom(from, to),
            _ => self.date,
        };

        FilterState {
            date,
            types: self.types,
            priorities: self.priorities,
            users: self.users,
            show_cleared: self.cleared,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Events { filters, details } => {
            commands::events::run(filters.into_filter(), details).await
        }
        Commands::New(args) => commands::new::run(args).await,
        Commands::Edit(args) => commands::edit::run(args).await,
        Commands::Clear(args) => commands::clear::run(args).await,
        Commands::Contacts { query, first_name } => {
            commands::lookup::contacts(&query, first_name).await
        }
        Commands::Accounts { query } => commands::lookup::accounts(&query).await,
        Commands::Colors => commands::colors::run().await,
        Commands::Config { action } => match action {
            None => commands::config::run(),
            Some(ConfigAction::Init { force }) => commands::config::init(force),
        },
    }
}

/// Logs go to stderr so they never mix with the table on stdout.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
