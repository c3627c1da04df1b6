//! Contact and account pickers.

use serde::Deserialize;

use crate::crm::{Crm, SearchQuery, SearchRecords, module};
use crate::error::BoardResult;
use crate::record::{Participant, RecordRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactQuery {
    /// Exact first-name match.
    FirstName(String),
    /// Full-text search across the contact.
    Word(String),
}

impl ContactQuery {
    fn to_search(&self) -> Option<SearchQuery> {
        match self {
            ContactQuery::FirstName(name) => {
                let name = name.trim();
                (!name.is_empty()).then(|| SearchQuery::Criteria(format!("(First_Name:equals:{name})")))
            }
            ContactQuery::Word(word) => {
                let word = word.trim();
                (!word.is_empty()).then(|| SearchQuery::Word(word.to_string()))
            }
        }
    }
}

/// Search contacts and merge the hits after the already `selected` ones.
/// Contacts appearing twice keep their first position.
pub async fn search_contacts<C: Crm + ?Sized>(
    crm: &C,
    query: &ContactQuery,
    selected: &[Participant],
) -> BoardResult<Vec<Participant>> {
    let Some(search) = query.to_search() else {
        return Ok(selected.to_vec());
    };

    let records = crm
        .search_records(SearchRecords {
            module: module::CONTACTS.to_string(),
            query: search,
        })
        .await?;

    let found = records
        .into_iter()
        .filter_map(|record| serde_json::from_value::<Participant>(record).ok());

    Ok(merge_contacts(selected.iter().cloned().chain(found)))
}

/// Deduplicate by contact id, keeping the first occurrence. Contacts without
/// an id are kept as they are.
pub fn merge_contacts(contacts: impl IntoIterator<Item = Participant>) -> Vec<Participant> {
    let mut merged: Vec<Participant> = Vec::new();
    for contact in contacts {
        let duplicate = contact.participant_id().is_some_and(|id| {
            merged.iter().any(|seen| seen.participant_id() == Some(id))
        });
        if !duplicate {
            merged.push(contact);
        }
    }
    merged
}

#[derive(Deserialize)]
struct AccountHit {
    id: Option<String>,
    #[serde(rename = "Account_Name")]
    account_name: Option<String>,
}

/// Word search on accounts. An empty query makes no call.
pub async fn search_accounts<C: Crm + ?Sized>(crm: &C, query: &str) -> BoardResult<Vec<RecordRef>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let records = crm
        .search_records(SearchRecords {
            module: module::ACCOUNTS.to_string(),
            query: SearchQuery::Word(query.to_string()),
        })
        .await?;

    Ok(records
        .into_iter()
        .filter_map(|record| serde_json::from_value::<AccountHit>(record).ok())
        .map(|hit| RecordRef {
            id: hit.id,
            name: hit.account_name,
        })
        .collect())
}
