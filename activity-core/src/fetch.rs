//! The record fetcher: everything the board loads for one date window.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::colors::RecentColors;
use crate::config::BoardConfig;
use crate::crm::{Crm, GetOrgVariable, ListRecords, SearchQuery, SearchRecords, SortOrder, module};
use crate::date_range::DateRange;
use crate::error::BoardResult;
use crate::reconcile::reconcile;
use crate::record::{RawEvent, User};

/// Result of one complete fetch. Built only when every call succeeded.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub events: Vec<RawEvent>,
    pub users: Vec<User>,
    pub recent_colors: RecentColors,
}

/// Search the window, list the module, read recent colors and users, then
/// reconcile the two event lists (listing entries win over search hits).
pub async fn fetch_snapshot<C: Crm + ?Sized>(
    crm: &C,
    config: &BoardConfig,
    tz: &Tz,
    window: DateRange,
    now: DateTime<Utc>,
) -> BoardResult<Snapshot> {
    let criteria = window.search_criteria(tz);
    tracing::debug!(%criteria, "searching events");

    let searched = crm
        .search_records(SearchRecords {
            module: module::EVENTS.to_string(),
            query: SearchQuery::Criteria(criteria),
        })
        .await?;

    let listed = list_events(crm, config).await?;

    let colors = crm
        .get_org_variable(GetOrgVariable {
            name: config.recent_colors_variable.clone(),
        })
        .await?;

    let users = crm.list_users().await?;

    let events = reconcile([to_events(searched), to_events(listed)], now);
    tracing::info!(events = events.len(), users = users.len(), "fetched activities");

    Ok(Snapshot {
        events,
        users,
        recent_colors: RecentColors::from_variable(colors.as_deref()),
    })
}

/// Listing pages, ascending, following `more_records` up to the configured
/// page count.
async fn list_events<C: Crm + ?Sized>(crm: &C, config: &BoardConfig) -> BoardResult<Vec<Value>> {
    let mut records = Vec::new();

    for page in 1..=config.listing_pages.max(1) {
        let result = crm
            .list_records(ListRecords {
                module: module::EVENTS.to_string(),
                page,
                per_page: config.page_size,
                sort_order: SortOrder::Asc,
            })
            .await?;

        records.extend(result.data);
        if !result.more_records {
            break;
        }
    }

    Ok(records)
}

/// Records whose fields have the wrong JSON type are skipped.
fn to_events(records: Vec<Value>) -> Vec<RawEvent> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<RawEvent>(record) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable event record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::RecordPage;
    use crate::crm::fake::FakeCrm;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    fn sydney() -> Tz {
        "Australia/Sydney".parse().unwrap()
    }

    fn window() -> DateRange {
        DateRange {
            from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn calls_in_order_and_reconciles() {
        let crm = FakeCrm::new().configure(|s| {
            s.search_results = vec![
                json!({"id": "A", "Event_Title": "from search", "Created_Time": "2024-01-01"}),
                json!({"id": "B", "Created_Time": "2024-01-03"}),
            ];
            s.pages = vec![RecordPage {
                data: vec![
                    json!({"id": "A", "Event_Title": "from listing", "Created_Time": "2024-01-01"}),
                    json!({"id": "C", "Created_Time": "2024-01-02"}),
                ],
                more_records: false,
            }];
            s.org_variables
                .insert("recent_colors".into(), r##"["#ff0000"]"##.into());
            s.users = vec![User {
                id: "u1".into(),
                full_name: "Sam Carter".into(),
                email: None,
            }];
        });

        let snapshot = fetch_snapshot(&crm, &BoardConfig::default(), &sydney(), window(), now())
            .await
            .unwrap();

        let ids: Vec<_> = snapshot.events.iter().filter_map(RawEvent::id).collect();
        assert_eq!(ids, vec!["B", "C", "A"]);
        assert_eq!(snapshot.events[2].title.as_deref(), Some("from listing"));
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.recent_colors.as_slice(), ["#ff0000"]);
        assert_eq!(
            crm.calls(),
            vec![
                "search_records:Events",
                "list_records:Events#1",
                "get_org_variable:recent_colors",
                "list_users:",
            ]
        );
    }

    #[tokio::test]
    async fn follows_more_records_up_to_the_page_limit() {
        let page = |id: &str| RecordPage {
            data: vec![json!({"id": id})],
            more_records: true,
        };
        let crm = FakeCrm::new().configure(|s| {
            s.pages = vec![page("p1"), page("p2"), page("p3")];
        });
        let config = BoardConfig {
            listing_pages: 2,
            ..Default::default()
        };

        let snapshot = fetch_snapshot(&crm, &config, &sydney(), window(), now())
            .await
            .unwrap();

        assert_eq!(snapshot.events.len(), 2);
        let listing_calls: Vec<_> = crm
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("list_records"))
            .collect();
        assert_eq!(listing_calls, vec!["list_records:Events#1", "list_records:Events#2"]);
    }

    #[tokio::test]
    async fn any_failure_aborts() {
        let crm = FakeCrm::new().configure(|s| {
            s.fail.insert("list_users");
        });

        let result = fetch_snapshot(&crm, &BoardConfig::default(), &sydney(), window(), now()).await;

        assert!(result.is_err());
    }

    #[test]
    fn mistyped_records_are_skipped() {
        let events = to_events(vec![json!({"id": "ok"}), json!({"id": "bad", "Owner": "not an object"})]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id(), Some("ok"));
    }
}
