//! Merging overlapping record lists into one ordered, duplicate-free list.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::record::RawEvent;

/// Merge `sources` into a single list with unique identifiers, newest first.
///
/// - Sources are concatenated in order; when two records share an identifier
///   the later one replaces the earlier one, keeping the earlier position.
/// - Records without an identifier are kept as they are.
/// - The result is sorted by creation time, descending. A record without a
///   readable creation time counts as created at `now`. The sort is stable.
pub fn reconcile<I>(sources: I, now: DateTime<Utc>) -> Vec<RawEvent>
where
    I: IntoIterator<Item = Vec<RawEvent>>,
{
    let mut merged: Vec<RawEvent> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for event in sources.into_iter().flatten() {
        match event.id().map(str::to_string) {
            Some(id) => match positions.get(&id) {
                Some(&index) => merged[index] = event,
                None => {
                    positions.insert(id, merged.len());
                    merged.push(event);
                }
            },
            None => merged.push(event),
        }
    }

    merged.sort_by_key(|event| std::cmp::Reverse(event.created_at().unwrap_or(now)));
    merged
}
