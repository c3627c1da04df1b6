use activity_core::Board;
use activity_core::crm::Provider;
use activity_core::lookup::ContactQuery;
use activity_core::record::{Participant, RecordRef, User};
use anyhow::Result;
use dialoguer::Select;
use owo_colors::OwoColorize;

use crate::commands::{finish, open_board};
use crate::utils::tui::while_spinning;

pub async fn contacts(query: &str, first_name: bool) -> Result<()> {
    let mut board = open_board().await?;

    let query = contact_query(query, first_name);
    let found = while_spinning("Searching contacts", board.search_contacts(&query, &[])).await;
    let found = finish(&mut board, found)?;

    if found.is_empty() {
        println!("{}", "No contacts found".dimmed());
        return Ok(());
    }

    for contact in &found {
        println!("{}", describe_contact(contact));
    }
    Ok(())
}

pub async fn accounts(query: &str) -> Result<()> {
    let mut board = open_board().await?;

    let found = while_spinning("Searching accounts", board.search_accounts(query)).await;
    let found = finish(&mut board, found)?;

    if found.is_empty() {
        println!("{}", "No accounts found".dimmed());
        return Ok(());
    }

    for account in &found {
        println!(
            "  {} {}",
            account.name.as_deref().unwrap_or("(unnamed)"),
            account.id.as_deref().unwrap_or_default().dimmed()
        );
    }
    Ok(())
}

fn contact_query(query: &str, first_name: bool) -> ContactQuery {
    if first_name {
        ContactQuery::FirstName(query.to_string())
    } else {
        ContactQuery::Word(query.to_string())
    }
}

fn describe_contact(contact: &Participant) -> String {
    let name = contact.display_name().unwrap_or("(unnamed)");
    let email = contact.email.as_deref().unwrap_or_default();
    let id = contact.participant_id().unwrap_or_default();
    format!("  {} {} {}", name, email.dimmed(), id.dimmed())
}

/// Search contacts for `query` and return the one the user means. Contacts
/// already in `selected` are not offered again.
pub async fn pick_contact(
    board: &mut Board<Provider>,
    query: &str,
    selected: &[Participant],
) -> Result<Participant> {
    let message = format!("Searching contacts for \"{query}\"");
    let search = ContactQuery::Word(query.to_string());
    let found = while_spinning(message, board.search_contacts(&search, selected)).await;
    let found = finish(board, found)?;

    let candidates: Vec<Participant> = found.into_iter().skip(selected.len()).collect();
    let labels: Vec<String> = candidates.iter().map(describe_contact).collect();
    let index = choose(&format!("Which contact for \"{query}\"?"), &labels)?;
    match index {
        Some(i) => Ok(candidates[i].clone()),
        None => anyhow::bail!("No contact matches \"{}\"", query),
    }
}

pub async fn pick_account(board: &mut Board<Provider>, query: &str) -> Result<RecordRef> {
    let message = format!("Searching accounts for \"{query}\"");
    let found = while_spinning(message, board.search_accounts(query)).await;
    let found = finish(board, found)?;

    let labels: Vec<String> = found
        .iter()
        .map(|a| a.name.clone().unwrap_or_else(|| "(unnamed)".to_string()))
        .collect();
    let index = choose(&format!("Which account for \"{query}\"?"), &labels)?;
    match index {
        Some(i) => Ok(found[i].clone()),
        None => anyhow::bail!("No account matches \"{}\"", query),
    }
}

/// Match a CRM user by (part of) their name.
pub fn pick_user(users: &[User], query: &str) -> Result<User> {
    let needle = query.to_lowercase();
    let candidates: Vec<&User> = users
        .iter()
        .filter(|u| u.full_name.to_lowercase().contains(&needle))
        .collect();

    let labels: Vec<String> = candidates.iter().map(|u| u.full_name.clone()).collect();
    match choose(&format!("Which user for \"{query}\"?"), &labels)? {
        Some(i) => Ok(candidates[i].clone()),
        None => anyhow::bail!("No user matches \"{}\"", query),
    }
}

/// None when there is nothing to pick; no prompt when there is one option.
fn choose(prompt: &str, labels: &[String]) -> Result<Option<usize>> {
    match labels.len() {
        0 => Ok(None),
        1 => Ok(Some(0)),
        _ => {
            let index = Select::new()
                .with_prompt(format!("  {prompt}"))
                .items(labels)
                .default(0)
                .interact()?;
            Ok(Some(index))
        }
    }
}
