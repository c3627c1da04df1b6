use activity_core::Board;
use activity_core::colors::is_hex_color;
use activity_core::crm::Provider;
use activity_core::draft::{EventDraft, Reminder};
use activity_core::filter::{ACTIVITY_TYPES, PRIORITIES};
use activity_core::gateway::Change;
use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::commands::lookup::{pick_account, pick_contact, pick_user};
use crate::commands::{finish, open_board};
use crate::input::{When, parse_minutes, parse_moment, parse_when};
use crate::utils::tui::while_spinning;

#[derive(Args)]
pub struct NewArgs {
    /// Event title
    pub title: String,

    #[command(flatten)]
    pub fields: FieldArgs,

    /// Create one event per contact instead of one shared event
    #[arg(long)]
    pub separate: bool,
}

/// Form fields shared by `new` and `edit`.
#[derive(Args, Default)]
pub struct FieldArgs {
    /// Activity type, e.g. "Meeting" or "Call"
    #[arg(short = 't', long = "type")]
    pub activity_type: Option<String>,

    /// Start, e.g. "tomorrow 3pm" (a day is enough with --banner)
    #[arg(short, long)]
    pub start: Option<String>,

    /// End, e.g. "tomorrow 4:30pm"
    #[arg(short, long, conflicts_with = "duration")]
    pub end: Option<String>,

    /// Duration, e.g. "45m" or "1h 30m"
    #[arg(short, long)]
    pub duration: Option<String>,

    /// Contact to invite, searched by name or email (repeatable)
    #[arg(short, long = "contact")]
    pub contacts: Vec<String>,

    /// Account to associate, searched by name
    #[arg(short, long)]
    pub account: Option<String>,

    /// CRM user the event is scheduled for (defaults to you)
    #[arg(long = "for")]
    pub owner: Option<String>,

    /// Low, Medium or High
    #[arg(short, long)]
    pub priority: Option<String>,

    /// e.g. "15 minutes before" or "1 day before"
    #[arg(short, long)]
    pub reminder: Option<Reminder>,

    /// Color as #rrggbb
    #[arg(long)]
    pub colour: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub regarding: Option<String>,

    #[arg(long)]
    pub venue: Option<String>,

    /// Show as a banner (06:00 to 07:00 on the start day)
    #[arg(long)]
    pub banner: bool,
}

pub async fn run(args: NewArgs) -> Result<()> {
    let mut board = open_board().await?;

    let mut draft = board.new_draft();
    draft.title = args.title;
    draft.separate_per_contact = args.separate;
    args.fields.apply(&mut board, &mut draft).await?;

    let message = format!("Creating \"{}\"", draft.title);
    let created = while_spinning(message, board.create(&draft)).await;
    let outcome = finish(&mut board, created)?;

    if let Change::Created(events) = &outcome.change {
        for id in events.iter().filter_map(|e| e.id()) {
            println!("  {}", id.dimmed());
        }
    }
    Ok(())
}

impl FieldArgs {
    /// Fold the given fields into `draft`, resolving contacts, account and
    /// owner against the CRM.
    pub async fn apply(self, board: &mut Board<Provider>, draft: &mut EventDraft) -> Result<()> {
        if let Some(activity_type) = &self.activity_type {
            draft.activity_type = one_of("activity type", activity_type, &ACTIVITY_TYPES)?;
        }
        if let Some(priority) = &self.priority {
            draft.priority = one_of("priority", priority, &PRIORITIES)?;
        }

        self.apply_schedule(draft)?;

        for query in &self.contacts {
            let contact = pick_contact(board, query, &draft.participants).await?;
            draft.participants.push(contact);
        }

        if let Some(query) = &self.account {
            draft.account = Some(pick_account(board, query).await?);
        }

        if let Some(query) = &self.owner {
            let loaded = while_spinning("Loading users", board.load_users()).await;
            let users = finish(board, loaded)?;
            draft.scheduled_for = Some(pick_user(&users, query)?);
        }

        if let Some(reminder) = self.reminder {
            draft.reminder = reminder;
        }

        if let Some(colour) = self.colour {
            let colour = colour.to_lowercase();
            if !is_hex_color(&colour) {
                anyhow::bail!("Colour must look like #rrggbb, got \"{}\"", colour);
            }
            draft.colour = Some(colour);
        }

        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(regarding) = self.regarding {
            draft.regarding = regarding;
        }
        if let Some(venue) = self.venue {
            draft.venue = venue;
        }

        Ok(())
    }

    /// Start, end, duration and banner. A banner pins the event to 06:00
    /// on its day, so `--end` and `--duration` only apply to timed events.
    fn apply_schedule(&self, draft: &mut EventDraft) -> Result<()> {
        match self.start.as_deref().map(parse_when).transpose()? {
            Some(When::At(start)) if self.banner => draft.set_banner(true, start.date()),
            Some(When::Day(day)) if self.banner => draft.set_banner(true, day),
            Some(When::At(start)) => draft.set_start(start),
            Some(When::Day(_)) => anyhow::bail!(
                "--start needs a time of day unless the event is a --banner"
            ),
            None if self.banner => match draft.start {
                Some(start) => draft.set_banner(true, start.date()),
                None => anyhow::bail!("--banner needs a --start day"),
            },
            None => {}
        }

        if !draft.banner {
            if let Some(end) = &self.end {
                draft.set_end(parse_moment(end)?);
            }
            if let Some(duration) = &self.duration {
                draft.set_duration(parse_minutes(duration)?);
            }
        }
        if let (Some(start), Some(end)) = (draft.start, draft.end)
            && end <= start
        {
            anyhow::bail!("The end must be after the start");
        }

        Ok(())
    }
}

/// Case-insensitive match against a fixed list of options.
fn one_of(what: &str, value: &str, options: &[&str]) -> Result<String> {
    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(value.trim()))
        .map(|o| o.to_string())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown {} \"{}\". Expected one of: {}",
                what,
                value,
                options.join(", ")
            )
        })
}
