//! Board state: the one place the live collection, cache and filters change.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::clear::{ClearChoice, ClearRequest};
use crate::colors::RecentColors;
use crate::config::BoardConfig;
use crate::crm::{Crm, SetOrgVariable};
use crate::date_range::DateFilter;
use crate::draft::EventDraft;
use crate::error::{BoardError, BoardResult};
use crate::fetch::fetch_snapshot;
use crate::filter::FilterState;
use crate::gateway::{Change, ClearOutcome, CreateOutcome, Gateway, HistoryStatus};
use crate::lookup::{self, ContactQuery};
use crate::record::{Participant, RawEvent, RecordRef, User};
use crate::row::{DisplayRow, project_all};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// A message for the host to show once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Notice {
            severity,
            message: message.into(),
        }
    }
}

/// What the host page handed over when it loaded the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub entity: Option<String>,
    pub record_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The CRM handle has not reported ready; nothing happened.
    NotReady,
    /// Served from the cache without any remote call.
    Cached,
    Fetched,
}

pub struct Board<C: Crm> {
    crm: C,
    config: BoardConfig,
    tz: Tz,
    events: Vec<RawEvent>,
    users: Vec<User>,
    /// Reconciled records per date filter key, kept for the whole session.
    cache: HashMap<String, Vec<RawEvent>>,
    recent_colors: RecentColors,
    filter: FilterState,
    loading: bool,
    ready: bool,
    page_context: Option<PageContext>,
    current_user: Option<User>,
    notices: Vec<Notice>,
}

impl<C: Crm> Board<C> {
    pub fn new(crm: C, config: BoardConfig) -> BoardResult<Self> {
        let tz = config.tz()?;
        Ok(Board {
            crm,
            config,
            tz,
            events: Vec::new(),
            users: Vec::new(),
            cache: HashMap::new(),
            recent_colors: RecentColors::default(),
            filter: FilterState::default(),
            loading: false,
            ready: false,
            page_context: None,
            current_user: None,
            notices: Vec::new(),
        })
    }

    /// The host may deliver its page context before or after the CRM is
    /// ready; either order works.
    pub fn set_page_context(&mut self, context: PageContext) {
        self.page_context = Some(context);
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Look up the logged-in user and mark the board ready.
    pub async fn connect(&mut self) -> BoardResult<()> {
        match self.crm.current_user().await {
            Ok(user) => {
                tracing::debug!(user = ?user.as_ref().map(|u| &u.full_name), "connected");
                self.current_user = user;
                self.mark_ready();
                Ok(())
            }
            Err(e) => Err(self.fail("Could not connect to the CRM", e)),
        }
    }

    /// Load the active date filter's records.
    pub async fn fetch(&mut self) -> BoardResult<FetchOutcome> {
        self.fetch_at(Utc::now()).await
    }

    /// Like [`Board::fetch`], with "now" supplied by the caller.
    ///
    /// A key already in the cache is served from it. Otherwise every call of
    /// the fetch must succeed before the collection, users and recent colors
    /// are replaced; on failure the previous state stays.
    pub async fn fetch_at(&mut self, now: DateTime<Utc>) -> BoardResult<FetchOutcome> {
        if !self.ready {
            tracing::debug!("fetch skipped, CRM not ready");
            return Ok(FetchOutcome::NotReady);
        }

        let key = self.filter.date.key();
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(%key, "serving cached activities");
            self.events = cached.clone();
            return Ok(FetchOutcome::Cached);
        }

        let today = now.with_timezone(&self.tz).date_naive();
        let window = self.filter.date.window(today, self.config.all_since);

        self.loading = true;
        let result = fetch_snapshot(&self.crm, &self.config, &self.tz, window, now).await;
        self.loading = false;

        match result {
            Ok(snapshot) => {
                self.cache.insert(key, snapshot.events.clone());
                self.events = snapshot.events;
                self.users = snapshot.users;
                self.recent_colors = snapshot.recent_colors;
                Ok(FetchOutcome::Fetched)
            }
            Err(e) => Err(self.fail("Failed to load activities", e)),
        }
    }

    /// Change the date selector and load its records.
    pub async fn select_date(&mut self, date: DateFilter) -> BoardResult<FetchOutcome> {
        self.filter.date = date;
        self.fetch().await
    }

    /// Drop the active key's cache entry and fetch it again.
    pub async fn refresh(&mut self) -> BoardResult<FetchOutcome> {
        self.cache.remove(&self.filter.date.key());
        self.fetch().await
    }

    /// Reset the filters. The date selector goes back to its default, so the
    /// default window is loaded (from cache when possible).
    pub async fn clear_filters(&mut self) -> BoardResult<FetchOutcome> {
        self.filter.clear();
        self.fetch().await
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Type, priority, user and cleared selections. Changing the date
    /// selector goes through [`Board::select_date`] so records get loaded.
    pub fn filter_mut(&mut self) -> &mut FilterState {
        &mut self.filter
    }

    /// The table as it should be displayed now.
    pub fn rows(&self) -> Vec<DisplayRow> {
        self.rows_at(Utc::now())
    }

    pub fn rows_at(&self, now: DateTime<Utc>) -> Vec<DisplayRow> {
        self.filter.apply(&project_all(&self.events, &self.tz, now))
    }

    pub fn events(&self) -> &[RawEvent] {
        &self.events
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn recent_colors(&self) -> &RecentColors {
        &self.recent_colors
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn page_context(&self) -> Option<&PageContext> {
        self.page_context.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn tz(&self) -> &Tz {
        &self.tz
    }

    /// Notices produced since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// A blank create form, scheduled for the logged-in user.
    pub fn new_draft(&self) -> EventDraft {
        EventDraft::for_owner(self.current_user.clone())
    }

    /// Fetch the record the edit dialog opens on, and its form.
    pub async fn open_edit(&mut self, id: &str) -> BoardResult<(RawEvent, EventDraft)> {
        let fetched = Gateway::new(&self.crm, &self.tz).prefetch(id).await;
        match fetched {
            Ok(event) => {
                let draft = EventDraft::from_event(&event, &self.tz);
                Ok((event, draft))
            }
            Err(e) => Err(self.fail("Could not load the activity", e)),
        }
    }

    /// Fetch the record the clear dialog opens on, and its checkbox state.
    pub async fn open_clear(&mut self, id: &str) -> BoardResult<(RawEvent, ClearChoice)> {
        let fetched = Gateway::new(&self.crm, &self.tz).prefetch(id).await;
        match fetched {
            Ok(event) => {
                let choice = ClearChoice::for_event(&event);
                Ok((event, choice))
            }
            Err(e) => Err(self.fail("Could not load the activity", e)),
        }
    }

    pub async fn create(&mut self, draft: &EventDraft) -> BoardResult<CreateOutcome> {
        let result = Gateway::new(&self.crm, &self.tz).create(draft).await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail("Failed to create the event", e)),
        };

        self.apply(&outcome.change);

        let created = outcome.created();
        match (created, outcome.failed) {
            (1, 0) => self.notify(Severity::Success, "Event created successfully!"),
            (n, 0) => self.notify(Severity::Success, format!("{n} events created successfully!")),
            (0, failed) => self.notify(Severity::Error, format!("All {failed} events failed to create.")),
            (n, failed) => self.notify(
                Severity::Warning,
                format!("{n} events created, {failed} failed."),
            ),
        }

        if let Some(colour) = &draft.colour {
            self.remember_color(colour).await;
        }

        Ok(outcome)
    }

    pub async fn update(&mut self, existing: &RawEvent, draft: &EventDraft) -> BoardResult<()> {
        let result = Gateway::new(&self.crm, &self.tz).update(existing, draft).await;
        let change = match result {
            Ok(change) => change,
            Err(e) => return Err(self.fail("Failed to update the event", e)),
        };

        self.apply(&change);
        self.notify(Severity::Success, "Event updated successfully!");

        if let Some(colour) = &draft.colour {
            self.remember_color(colour).await;
        }
        Ok(())
    }

    pub async fn clear_or_erase(
        &mut self,
        event: &RawEvent,
        request: &ClearRequest,
    ) -> BoardResult<ClearOutcome> {
        let result = Gateway::new(&self.crm, &self.tz)
            .clear_or_erase(event, request)
            .await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail("An unexpected error occurred, try again!", e)),
        };

        self.apply(&outcome.change);

        let done = request.action.past_tense();
        match &outcome.history {
            HistoryStatus::NotRequested => {
                self.notify(Severity::Success, format!("Event {done} successfully!"))
            }
            HistoryStatus::Written { failed_links: 0, .. } => self.notify(
                Severity::Success,
                format!("Event {done} and history created successfully!"),
            ),
            HistoryStatus::Written { links, failed_links } => self.notify(
                Severity::Warning,
                format!("Event {done}; {failed_links} of {links} history contacts could not be linked."),
            ),
            HistoryStatus::Failed(_) => self.notify(
                Severity::Warning,
                format!("Event {done}, but history creation failed."),
            ),
        }

        Ok(outcome)
    }

    /// Contact picker search; hits are merged after the `selected` contacts.
    pub async fn search_contacts(
        &mut self,
        query: &ContactQuery,
        selected: &[Participant],
    ) -> BoardResult<Vec<Participant>> {
        let result = lookup::search_contacts(&self.crm, query, selected).await;
        result.map_err(|e| self.fail("Contact search failed", e))
    }

    pub async fn search_accounts(&mut self, query: &str) -> BoardResult<Vec<RecordRef>> {
        let result = lookup::search_accounts(&self.crm, query).await;
        result.map_err(|e| self.fail("Account search failed", e))
    }

    /// Reload the CRM users without refetching events.
    pub async fn load_users(&mut self) -> BoardResult<Vec<User>> {
        match self.crm.list_users().await {
            Ok(users) => {
                self.users = users.clone();
                Ok(users)
            }
            Err(e) => Err(self.fail("Loading users failed", e)),
        }
    }

    /// Put `color` at the front of the recent list and store it org-wide.
    pub async fn record_color(&mut self, color: &str) -> BoardResult<()> {
        let mut recent = self.recent_colors.clone();
        if !recent.push(color) {
            return Ok(());
        }

        self.crm
            .set_org_variable(SetOrgVariable {
                name: self.config.recent_colors_variable.clone(),
                value: recent.to_variable(),
            })
            .await?;

        self.recent_colors = recent;
        Ok(())
    }

    /// Recent colors are a convenience; failing to store one only warns.
    async fn remember_color(&mut self, color: &str) {
        if let Err(e) = self.record_color(color).await {
            tracing::warn!(error = %e, "could not store recent color");
        }
    }

    /// Fold a change into the live collection and the active cache entry.
    fn apply(&mut self, change: &Change) {
        self.events = change.fold(&self.events);
        if let Some(cached) = self.cache.get_mut(&self.filter.date.key()) {
            *cached = change.fold(cached);
        }
    }

    fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        self.notices.push(Notice::new(severity, message));
    }

    /// Log and report an error, then hand it back for the caller to return.
    fn fail(&mut self, message: &str, error: BoardError) -> BoardError {
        tracing::error!(error = %error, "{message}");
        let message = match &error {
            BoardError::Draft(draft) => format!("{message}: {draft}"),
            _ => message.to_string(),
        };
        self.notify(Severity::Error, message);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clear::ClearAction;
    use crate::crm::RecordPage;
    use crate::crm::fake::FakeCrm;
    use crate::record::Participant;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        // 2024-03-15 in Sydney
        Utc.with_ymd_and_hms(2024, 3, 15, 1, 0, 0).unwrap()
    }

    fn listed_crm() -> FakeCrm {
        FakeCrm::new().configure(|s| {
            s.pages = vec![RecordPage {
                data: vec![
                    json!({
                        "id": "e1",
                        "Event_Title": "Older",
                        "Start_DateTime": "2024-03-01T09:00:00+11:00",
                        "Created_Time": "2024-02-01T00:00:00+11:00",
                        "Event_Priority": "High"
                    }),
                    json!({
                        "id": "e2",
                        "Event_Title": "Newer",
                        "Start_DateTime": "2024-03-10T09:00:00+11:00",
                        "Created_Time": "2024-02-05T00:00:00+11:00",
                        "Participants": [{"name": "Ann Lee", "participant": "c1", "type": "contact"}]
                    }),
                ],
                more_records: false,
            }];
            s.current_user = Some(User {
                id: "u1".into(),
                full_name: "Sam Carter".into(),
                email: None,
            });
        })
    }

    async fn ready_board(crm: FakeCrm) -> Board<FakeCrm> {
        let mut board = Board::new(crm, BoardConfig::default()).unwrap();
        board.connect().await.unwrap();
        board.fetch_at(now()).await.unwrap();
        board
    }

    fn valid_draft(board: &Board<FakeCrm>) -> EventDraft {
        let mut draft = board.new_draft();
        draft.activity_type = "Call".into();
        draft.title = "Ring back".into();
        draft.set_start(
            NaiveDate::from_ymd_opt(2024, 3, 20)
                .unwrap()
                .and_hms_opt(11, 0, 0)
                .unwrap(),
        );
        draft.participants = vec![Participant {
            full_name: Some("Ann Lee".into()),
            id: Some("c1".into()),
            ..Default::default()
        }];
        draft
    }

    #[tokio::test]
    async fn fetch_is_a_no_op_until_ready() {
        let mut board = Board::new(listed_crm(), BoardConfig::default()).unwrap();
        board.set_page_context(PageContext {
            entity: Some("Accounts".into()),
            record_ids: vec!["a1".into()],
        });

        assert_eq!(board.fetch_at(now()).await.unwrap(), FetchOutcome::NotReady);
        assert!(board.crm.calls().is_empty());

        board.mark_ready();
        assert_eq!(board.fetch_at(now()).await.unwrap(), FetchOutcome::Fetched);
        assert_eq!(board.events().len(), 2);
        assert_eq!(board.page_context().map(|c| c.record_ids.len()), Some(1));
    }

    #[tokio::test]
    async fn cached_key_makes_no_calls() {
        let mut board = ready_board(listed_crm()).await;
        let calls_before = board.crm.calls().len();

        assert_eq!(board.fetch_at(now()).await.unwrap(), FetchOutcome::Cached);
        assert_eq!(board.crm.calls().len(), calls_before);
        assert_eq!(board.current_user().map(|u| u.id.as_str()), Some("u1"));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_collection() {
        let mut board = ready_board(listed_crm()).await;
        board.crm.with(|s| {
            s.fail.insert("get_org_variable");
        });
        board.filter_mut().date = DateFilter::Last7Days;

        assert!(board.fetch_at(now()).await.is_err());

        assert!(!board.is_loading());
        assert_eq!(board.events().len(), 2);
        let notices = board.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Error);

        // nothing was cached for the failed key, so it is fetched again
        board.crm.with(|s| {
            s.fail.clear();
        });
        assert_eq!(board.fetch_at(now()).await.unwrap(), FetchOutcome::Fetched);
    }

    #[tokio::test]
    async fn rows_are_filtered_and_date_sorted() {
        let mut board = ready_board(listed_crm()).await;

        let rows = board.rows_at(now());
        let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);

        board.filter_mut().priorities = vec!["High".into()];
        let rows = board.rows_at(now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "e1");
    }

    #[tokio::test]
    async fn empty_participant_create_is_rejected_without_calls() {
        let mut board = ready_board(listed_crm()).await;
        let calls_before = board.crm.calls().len();
        let mut draft = valid_draft(&board);
        draft.participants.clear();

        let result = board.create(&draft).await;

        assert!(matches!(result, Err(BoardError::Draft(_))));
        assert_eq!(board.crm.calls().len(), calls_before);
        assert_eq!(board.events().len(), 2);
    }

    #[tokio::test]
    async fn created_event_is_prepended_and_cached() {
        let mut board = ready_board(listed_crm()).await;
        let mut draft = valid_draft(&board);
        draft.colour = Some("#0066cc".into());

        board.create(&draft).await.unwrap();

        assert_eq!(board.events()[0].id(), Some("new-1"));
        assert_eq!(board.recent_colors().as_slice(), ["#0066cc"]);
        assert_eq!(
            board.take_notices(),
            vec![Notice::new(Severity::Success, "Event created successfully!")]
        );

        // switch away and back: the default key still shows the new record
        board.select_date(DateFilter::Last7Days).await.unwrap();
        board.select_date(DateFilter::All).await.unwrap();
        assert_eq!(board.events()[0].id(), Some("new-1"));
    }

    #[tokio::test]
    async fn clearing_closes_the_row() {
        let mut board = ready_board(listed_crm()).await;
        board.crm.with(|s| {
            s.records
                .insert("e2".into(), json!({"id": "e2", "Event_Title": "Newer"}));
        });

        let (event, mut choice) = board.open_clear("e2").await.unwrap();
        choice.set_clear(true);
        let Some(action) = choice.action() else {
            panic!("clear should be submittable");
        };
        assert_eq!(action, ClearAction::Clear);

        board
            .clear_or_erase(&event, &ClearRequest::new(action).with_result("Call Completed"))
            .await
            .unwrap();

        board.filter_mut().show_cleared = true;
        let rows = board.rows_at(now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "e2");
    }

    #[tokio::test]
    async fn unlinked_history_contacts_give_a_warning() {
        let mut board = ready_board(listed_crm()).await;
        board.take_notices();
        board.crm.with(|s| {
            s.records.insert(
                "e2".into(),
                json!({
                    "id": "e2",
                    "Event_Title": "Newer",
                    "Participants": [
                        {"name": "Ann Lee", "participant": "c1", "type": "contact"},
                        {"name": "Bo Chen", "participant": "c2", "type": "contact"},
                        {"name": "Cy Diaz", "participant": "c3", "type": "contact"}
                    ]
                }),
            );
            s.reject_refs.extend(["c1".to_string(), "c3".to_string()]);
        });

        let (event, _) = board.open_clear("e2").await.unwrap();
        let request = ClearRequest::new(ClearAction::Clear).with_history("Spoke to all three");
        let outcome = board.clear_or_erase(&event, &request).await.unwrap();

        assert_eq!(
            outcome.history,
            HistoryStatus::Written {
                links: 3,
                failed_links: 2
            }
        );
        let notices = board.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Warning);
        assert!(
            notices[0]
                .message
                .contains("2 of 3 history contacts could not be linked")
        );
        assert!(board.events().iter().any(|e| e.id() == Some("e2") && e.is_closed()));
    }

    #[tokio::test]
    async fn users_load_without_refetching_events() {
        let mut board = ready_board(listed_crm()).await;
        board.crm.with(|s| {
            s.users = vec![User {
                id: "u2".into(),
                full_name: "Jo Park".into(),
                email: None,
            }];
        });
        let calls_before = board.crm.calls().len();

        let users = board.load_users().await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(board.users()[0].full_name, "Jo Park");
        assert_eq!(&board.crm.calls()[calls_before..], ["list_users:"]);
    }

    #[tokio::test]
    async fn failed_update_leaves_state_untouched() {
        let mut board = ready_board(listed_crm()).await;
        board.crm.with(|s| {
            s.reject_modules.insert("Events".into());
        });
        let existing = board.events()[1].clone();
        let mut draft = EventDraft::from_event(&existing, board.tz());
        draft.activity_type = "Meeting".into();
        draft.title = "Changed".into();
        draft.set_duration(30);
        draft.participants = valid_draft(&board).participants;

        assert!(board.update(&existing, &draft).await.is_err());
        assert_eq!(board.events()[1], existing);
    }

    #[tokio::test]
    async fn custom_ranges_have_their_own_cache_entries() {
        let mut board = ready_board(listed_crm()).await;
        let march = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();

        board
            .select_date(DateFilter::custom(march(1), march(5)))
            .await
            .unwrap();
        let outcome = board
            .select_date(DateFilter::custom(march(6), march(12)))
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Fetched);

        // the custom range is enforced on the rows too
        let rows = board.rows_at(now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "e2");
    }

    #[tokio::test]
    async fn failed_contact_search_leaves_an_error_notice() {
        let mut board = ready_board(listed_crm()).await;
        board.take_notices();
        board.crm.with(|s| {
            s.fail.insert("search_records");
        });

        let query = ContactQuery::Word("ann".into());
        assert!(board.search_contacts(&query, &[]).await.is_err());

        let notices = board.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Error);
        assert_eq!(board.events().len(), 2);
    }

    #[tokio::test]
    async fn recorded_colors_are_stored_org_wide() {
        let mut board = ready_board(listed_crm()).await;

        board.record_color("#FF0000").await.unwrap();
        board.record_color("#00ff00").await.unwrap();
        board.record_color("#ff0000").await.unwrap();

        assert_eq!(board.recent_colors().as_slice(), ["#ff0000", "#00ff00"]);
        let stored = board
            .crm
            .with(|s| s.org_variables.get("recent_colors").cloned());
        assert_eq!(stored.as_deref(), Some(r##"["#ff0000","#00ff00"]"##));
    }
}
