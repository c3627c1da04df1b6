use activity_core::record::Participant;
use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::commands::new::FieldArgs;
use crate::commands::{finish, open_board};
use crate::utils::tui::while_spinning;

#[derive(Args)]
pub struct EditArgs {
    /// Id of the activity to edit
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub fields: FieldArgs,

    /// Turn a banner back into a regular event
    #[arg(long, conflicts_with = "banner")]
    pub no_banner: bool,

    /// Remove a participant by name, email or id (repeatable)
    #[arg(long = "remove-contact")]
    pub remove_contacts: Vec<String>,

    /// Drop the associated account
    #[arg(long, conflicts_with = "account")]
    pub no_account: bool,
}

pub async fn run(args: EditArgs) -> Result<()> {
    let mut board = open_board().await?;

    let opened = while_spinning(format!("Loading {}", args.id), board.open_edit(&args.id)).await;
    let (existing, original) = finish(&mut board, opened)?;

    let mut draft = original.clone();
    if let Some(title) = args.title {
        draft.title = title;
    }
    if args.no_banner {
        draft.banner = false;
    }
    if args.no_account {
        draft.account = None;
    }
    for needle in &args.remove_contacts {
        let before = draft.participants.len();
        draft.participants.retain(|p| !matches_participant(p, needle));
        if draft.participants.len() == before {
            anyhow::bail!("No participant matches \"{}\"", needle);
        }
    }
    args.fields.apply(&mut board, &mut draft).await?;

    if draft == original {
        println!("{}", "Nothing to change".dimmed());
        return Ok(());
    }

    let message = format!("Updating \"{}\"", draft.title);
    let updated = while_spinning(message, board.update(&existing, &draft)).await;
    finish(&mut board, updated)
}

fn matches_participant(participant: &Participant, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let hit = |value: Option<&str>| value.is_some_and(|v| v.to_lowercase().contains(&needle));
    participant.participant_id() == Some(needle.as_str())
        || hit(participant.display_name())
        || hit(participant.email.as_deref())
}
