use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    model::{find_tracker, Category, FilterMode, Tracker, TrackerDraft},
    services::{
        analytics::{Analytics, AnalyticsEvent, EventItem, MAIN_SCREEN},
        localization::Localizer,
    },
    storage::{StoreError, StoreEvent, TrackerStore},
    tracking::{
        day_count::format_day_count,
        ledger::CompletionLedger,
        visibility::{empty_state, visible_trackers, EmptyState, VisibilityQuery, VisibleTrackers},
    },
    utils::{
        clock::Clock,
        percentage::{count_percentage, Percentage},
    },
};

/// Shortest id prefix accepted as a tracker reference.
const MIN_ID_PREFIX: usize = 4;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No tracker matches {0:?}")]
    UnknownTracker(String),
    #[error("{0:?} matches more than one tracker")]
    AmbiguousTracker(String),
    #[error("Can't mark trackers on {0}, it is in the future")]
    FutureCompletion(NaiveDate),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Numbers shown on the statistics screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Every completion record ever made.
    pub completed: usize,
    /// Days with at least one completion.
    pub active_days: usize,
    /// Share of trackers due on the selected date that are done. `None` when nothing is due.
    pub progress: Option<Percentage>,
}

impl Statistics {
    pub fn is_empty(&self) -> bool {
        self.completed == 0
    }
}

/// State of the main screen together with the services it talks to.
///
/// The session keeps an in memory copy of the catalog and the completion ledger. Mutations go
/// through the store, which announces them; [TrackerSession::sync] and
/// [TrackerSession::next_change] bring the copy up to date afterwards.
pub struct TrackerSession<S> {
    store: S,
    analytics: Box<dyn Analytics>,
    localizer: Box<dyn Localizer>,
    clock: Box<dyn Clock>,
    changes: Option<broadcast::Receiver<StoreEvent>>,
    categories: Vec<Category>,
    ledger: CompletionLedger,
    date: NaiveDate,
    filter: FilterMode,
    search: String,
}

impl<S: TrackerStore> TrackerSession<S> {
    pub fn new(
        store: S,
        analytics: Box<dyn Analytics>,
        localizer: Box<dyn Localizer>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let date = clock.today();
        Self {
            store,
            analytics,
            localizer,
            clock,
            changes: None,
            categories: vec![],
            ledger: CompletionLedger::new(),
            date,
            filter: FilterMode::default(),
            search: String::new(),
        }
    }

    /// Subscribes to the store and reads everything. Subscribing first means no change made in
    /// between can be missed.
    pub async fn load(&mut self) -> anyhow::Result<()> {
        self.changes = Some(self.store.subscribe());
        self.reload().await?;
        self.analytics.report(&AnalyticsEvent::open(MAIN_SCREEN));
        Ok(())
    }

    pub fn close(&self) {
        self.analytics.report(&AnalyticsEvent::close(MAIN_SCREEN));
    }

    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        let (categories, records) = futures::try_join!(
            self.store.list_categories(),
            self.store.list_completion_records()
        )?;
        self.categories = categories;
        self.ledger = records.into_iter().collect();
        debug!(
            "Loaded {} categories and {} records",
            self.categories.len(),
            self.ledger.len()
        );
        Ok(())
    }

    /// Applies pending store notifications. Returns whether anything changed.
    pub async fn sync(&mut self) -> Result<bool, StoreError> {
        let Some(changes) = self.changes.as_mut() else {
            return Ok(false);
        };
        let mut changed = false;
        loop {
            match changes.try_recv() {
                Ok(event) => {
                    debug!("Store changed: {event:?}");
                    changed = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} store notifications");
                    changed = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    self.changes = None;
                    break;
                }
            }
        }
        if changed {
            self.reload().await?;
        }
        Ok(changed)
    }

    /// Waits for the next store notification. Never resolves when there is no subscription, so
    /// it can sit in a `select!` next to other sources.
    pub async fn next_change(&mut self) -> StoreEvent {
        loop {
            let Some(changes) = self.changes.as_mut() else {
                return std::future::pending().await;
            };
            match changes.recv().await {
                Ok(event) => return event,
                // Everything is reloaded on any event, so the kind doesn't matter.
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} store notifications");
                    return StoreEvent::Categories;
                }
                Err(RecvError::Closed) => {
                    info!("Store notifications closed");
                    self.changes = None;
                }
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn localizer(&self) -> &dyn Localizer {
        self.localizer.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn ledger(&self) -> &CompletionLedger {
        &self.ledger
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        debug!("Selected {date}");
        self.date = date;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// Changes the filter. Picking [FilterMode::Today] also jumps back to today.
    pub fn set_filter(&mut self, filter: FilterMode) {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, EventItem::Filter));
        if filter == FilterMode::Today {
            self.date = self.clock.today();
        }
        self.filter = filter;
    }

    /// Puts back the filter remembered from a previous run. Not a user action, so nothing is
    /// reported.
    pub fn restore_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    pub fn visible(&self) -> VisibleTrackers<'_> {
        visible_trackers(
            &self.categories,
            &self.ledger,
            &VisibilityQuery {
                date: self.date,
                mode: self.filter,
                search: &self.search,
            },
        )
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        empty_state(&self.categories, &self.visible())
    }

    /// Resolves a tracker by its full id, an id prefix of at least four characters or its exact
    /// name. A reference matching several trackers, through either the prefix or the name, is
    /// ambiguous.
    pub fn find_tracker(&self, reference: &str) -> Result<&Tracker, SessionError> {
        let reference = reference.trim();
        if let Ok(id) = Uuid::parse_str(reference) {
            if let Some(tracker) = find_tracker(&self.categories, id) {
                return Ok(tracker);
            }
        }

        let prefix = reference.to_ascii_lowercase();
        let by_prefix =
            prefix.len() >= MIN_ID_PREFIX && prefix.chars().all(|c| c.is_ascii_hexdigit());
        let mut matches = self
            .categories
            .iter()
            .flat_map(|c| c.trackers.iter())
            .filter(|t| {
                t.name == reference
                    || (by_prefix && t.id.simple().to_string().starts_with(&prefix))
            });

        match (matches.next(), matches.next()) {
            (Some(tracker), None) => Ok(tracker),
            (None, _) => {
                warn!("Unknown tracker {reference:?}");
                Err(SessionError::UnknownTracker(reference.to_string()))
            }
            (Some(_), Some(_)) => {
                warn!("Ambiguous tracker {reference:?}");
                Err(SessionError::AmbiguousTracker(reference.to_string()))
            }
        }
    }

    pub fn is_done(&self, tracker_id: Uuid) -> bool {
        self.ledger.is_done(tracker_id, self.date)
    }

    /// Localized "N days" label of the tracker.
    pub fn day_count_label(&self, tracker_id: Uuid) -> String {
        format_day_count(self.ledger.count_done(tracker_id), self.localizer())
    }

    pub fn statistics(&self) -> Statistics {
        let due = self
            .categories
            .iter()
            .flat_map(|c| c.trackers.iter())
            .filter(|t| t.is_scheduled_on(self.date))
            .collect::<Vec<_>>();
        let done = due.iter().filter(|t| self.is_done(t.id)).count();
        Statistics {
            completed: self.ledger.len(),
            active_days: self.ledger.days_with_completions().len(),
            progress: count_percentage(done, due.len()),
        }
    }

    fn known_tracker(&self, tracker_id: Uuid) -> Result<(), SessionError> {
        if find_tracker(&self.categories, tracker_id).is_some() {
            Ok(())
        } else {
            warn!("Unknown tracker {tracker_id}");
            Err(SessionError::UnknownTracker(tracker_id.to_string()))
        }
    }

    fn check_not_future(&self) -> Result<(), SessionError> {
        if self.date > self.clock.today() {
            warn!("Refusing to change completions on {}", self.date);
            Err(SessionError::FutureCompletion(self.date))
        } else {
            Ok(())
        }
    }

    /// Marks the tracker as done on the selected date if it wasn't, and the other way around.
    /// Returns whether it is done now.
    pub async fn toggle_done(&mut self, tracker_id: Uuid) -> Result<bool, SessionError> {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, EventItem::Track));
        if self.is_done(tracker_id) {
            self.mark_undone(tracker_id).await?;
            Ok(false)
        } else {
            self.mark_done(tracker_id).await?;
            Ok(true)
        }
    }

    /// Returns `false` when it was already done. A failure to persist is only logged; the
    /// in memory state keeps the mark.
    #[instrument(skip(self))]
    pub async fn mark_done(&mut self, tracker_id: Uuid) -> Result<bool, SessionError> {
        self.known_tracker(tracker_id)?;
        self.check_not_future()?;
        if !self.ledger.mark_done(tracker_id, self.date) {
            return Ok(false);
        }
        if let Err(e) = self
            .store
            .add_completion_record(tracker_id, self.date)
            .await
        {
            error!("Failed to save completion: {e}");
        }
        Ok(true)
    }

    /// Returns `false` when it wasn't done.
    #[instrument(skip(self))]
    pub async fn mark_undone(&mut self, tracker_id: Uuid) -> Result<bool, SessionError> {
        self.known_tracker(tracker_id)?;
        self.check_not_future()?;
        if !self.ledger.mark_undone(tracker_id, self.date) {
            return Ok(false);
        }
        if let Err(e) = self
            .store
            .remove_completion_record(tracker_id, self.date)
            .await
        {
            error!("Failed to remove completion: {e}");
        }
        Ok(true)
    }

    pub async fn create_category(&mut self, name: &str) -> Result<(), SessionError> {
        self.store.create_category(name).await?;
        self.sync().await?;
        Ok(())
    }

    pub async fn rename_category(
        &mut self,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), SessionError> {
        self.store.rename_category(old_name, new_name).await?;
        self.sync().await?;
        Ok(())
    }

    pub async fn delete_category(&mut self, name: &str) -> Result<(), SessionError> {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, EventItem::Delete));
        self.store.delete_category(name).await?;
        self.sync().await?;
        Ok(())
    }

    pub async fn create_tracker(&mut self, draft: TrackerDraft) -> Result<Tracker, SessionError> {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, EventItem::AddTrack));
        let tracker = self.store.create_tracker(draft).await?;
        self.sync().await?;
        Ok(tracker)
    }

    pub async fn update_tracker(&mut self, tracker: Tracker) -> Result<(), SessionError> {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, EventItem::Edit));
        self.store.update_tracker(tracker).await?;
        self.sync().await?;
        Ok(())
    }

    pub async fn delete_tracker(&mut self, tracker_id: Uuid) -> Result<(), SessionError> {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, EventItem::Delete));
        self.store.delete_tracker(tracker_id).await?;
        self.ledger.forget(tracker_id);
        self.sync().await?;
        Ok(())
    }

    /// Returns whether the tracker is pinned now.
    pub async fn toggle_pinned(&mut self, tracker_id: Uuid) -> Result<bool, SessionError> {
        let pinned = self.store.toggle_pinned(tracker_id).await?;
        self.sync().await?;
        Ok(pinned)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use mockall::predicate::eq;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::broadcast;

    use crate::{
        model::{FilterMode, Rgb, Schedule, TrackerDraft, Weekday},
        services::{
            analytics::{AnalyticsEvent, EventItem, MockAnalytics, MAIN_SCREEN},
            localization::{BundledLocalizer, Locale},
        },
        storage::{JsonTrackerStore, MockTrackerStore, StoreError, TrackerStore},
        tracking::visibility::{EmptyState, SectionTitle},
        utils::{clock::FixedClock, logging::TEST_LOGGING},
    };

    use super::{SessionError, TrackerSession};

    // A Wednesday
    const TODAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();

    fn quiet_analytics() -> Box<MockAnalytics> {
        let mut analytics = MockAnalytics::new();
        analytics.expect_report().return_const(());
        Box::new(analytics)
    }

    fn session_with<S: TrackerStore>(
        store: S,
        analytics: Box<MockAnalytics>,
    ) -> TrackerSession<S> {
        TrackerSession::new(
            store,
            analytics,
            Box::new(BundledLocalizer::new(Locale::En)),
            Box::new(FixedClock::on(TODAY)),
        )
    }

    async fn json_session() -> Result<(TempDir, TrackerSession<JsonTrackerStore>)> {
        let dir = tempdir()?;
        let store = JsonTrackerStore::new(dir.path().to_owned())?;
        let mut session = session_with(store, quiet_analytics());
        session.load().await?;
        Ok((dir, session))
    }

    fn weekly(name: &str, category: &str, days: &[Weekday]) -> TrackerDraft {
        TrackerDraft {
            name: name.into(),
            color: Rgb::new(0xFD, 0x4C, 0x49),
            emoji: "🙂".into(),
            schedule: Schedule::Weekly(days.iter().copied().collect()),
            category: category.into(),
        }
    }

    #[tokio::test]
    async fn test_session_lists_trackers_due_today() -> Result<()> {
        *TEST_LOGGING;
        let (_dir, mut session) = json_session().await?;
        assert_eq!(session.empty_state(), Some(EmptyState::NoTrackers));

        session.create_category("Home").await?;
        let a = session
            .create_tracker(weekly(
                "A",
                "Home",
                &[Weekday::Monday, Weekday::Wednesday, Weekday::Friday],
            ))
            .await?;
        session
            .create_tracker(TrackerDraft {
                schedule: Schedule::OnDate(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
                ..weekly("B", "Home", &[])
            })
            .await?;

        let visible = session.visible();
        assert_eq!(visible.sections.len(), 1);
        assert_eq!(visible.sections[0].title, SectionTitle::Category("Home"));
        assert_eq!(
            visible.trackers().map(|t| t.id).collect::<Vec<_>>(),
            vec![a.id]
        );

        session.select_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let names = session
            .visible()
            .trackers()
            .map(|t| t.name.clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "B"]);

        session.set_search("nothing like it");
        assert_eq!(session.empty_state(), Some(EmptyState::NothingFound));
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_done_persists() -> Result<()> {
        let (dir, mut session) = json_session().await?;
        session.create_category("Home").await?;
        let tracker = session
            .create_tracker(weekly("Dishes", "Home", &Weekday::ALL))
            .await?;

        assert!(session.toggle_done(tracker.id).await?);
        assert!(session.is_done(tracker.id));
        assert_eq!(session.day_count_label(tracker.id), "1 day");

        let mut reopened = session_with(
            JsonTrackerStore::new(dir.path().to_owned())?,
            quiet_analytics(),
        );
        reopened.load().await?;
        assert!(reopened.is_done(tracker.id));

        assert!(!session.toggle_done(tracker.id).await?);
        assert!(!session.is_done(tracker.id));
        assert!(!session.mark_undone(tracker.id).await?);
        assert_eq!(session.day_count_label(tracker.id), "0 days");
        Ok(())
    }

    #[tokio::test]
    async fn test_future_completion_is_rejected() -> Result<()> {
        let (_dir, mut session) = json_session().await?;
        session.create_category("Home").await?;
        let tracker = session
            .create_tracker(weekly("Dishes", "Home", &Weekday::ALL))
            .await?;

        session.select_date(TODAY.succ_opt().unwrap());
        let result = session.mark_done(tracker.id).await;

        assert!(matches!(result, Err(SessionError::FutureCompletion(_))));
        assert!(session.ledger().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tracker_is_reported() -> Result<()> {
        let (_dir, mut session) = json_session().await?;
        let result = session.mark_done(uuid::Uuid::new_v4()).await;
        assert!(matches!(result, Err(SessionError::UnknownTracker(_))));
        assert!(matches!(
            session.find_tracker("Nope"),
            Err(SessionError::UnknownTracker(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_find_tracker_by_id_prefix_or_name() -> Result<()> {
        let (_dir, mut session) = json_session().await?;
        session.create_category("Home").await?;
        let tracker = session
            .create_tracker(weekly("Water plants", "Home", &Weekday::ALL))
            .await?;

        let id = tracker.id.to_string();
        assert_eq!(session.find_tracker(&id)?.id, tracker.id);
        assert_eq!(session.find_tracker(&tracker.short_id())?.id, tracker.id);
        assert_eq!(session.find_tracker("Water plants")?.id, tracker.id);
        assert!(session.find_tracker("Water").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_name_shadowed_by_id_prefix_is_ambiguous() -> Result<()> {
        let named = weekly("cafe", "Home", &Weekday::ALL)
            .into_tracker(uuid::Uuid::from_u128(0x11111111_0000_4000_8000_000000000000));
        let prefixed = weekly("Dishes", "Home", &Weekday::ALL)
            .into_tracker(uuid::Uuid::from_u128(0xcafe0000_0000_4000_8000_000000000000));
        let category = crate::model::Category::new("Home")
            .with_trackers(vec![named.clone(), prefixed.clone()]);

        let mut store = MockTrackerStore::new();
        let (sender, _) = broadcast::channel(4);
        store
            .expect_subscribe()
            .returning(move || sender.subscribe());
        store
            .expect_list_categories()
            .returning(move || Ok(vec![category.clone()]));
        store
            .expect_list_completion_records()
            .returning(|| Ok(vec![]));

        let mut session = session_with(store, quiet_analytics());
        session.load().await?;

        assert!(matches!(
            session.find_tracker("cafe"),
            Err(SessionError::AmbiguousTracker(_))
        ));
        assert_eq!(session.find_tracker("cafe0")?.id, prefixed.id);
        assert_eq!(session.find_tracker("1111")?.id, named.id);
        assert_eq!(session.find_tracker("Dishes")?.id, prefixed.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_today_filter_resets_date() -> Result<()> {
        let (_dir, mut session) = json_session().await?;
        session.select_date(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());

        session.set_filter(FilterMode::Completed);
        assert_eq!(
            session.date(),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
        );

        session.set_filter(FilterMode::Today);
        assert_eq!(session.date(), TODAY);
        assert_eq!(session.filter(), FilterMode::Today);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category_cleans_ledger() -> Result<()> {
        let (_dir, mut session) = json_session().await?;
        session.create_category("Home").await?;
        let tracker = session
            .create_tracker(weekly("Dishes", "Home", &Weekday::ALL))
            .await?;
        session.mark_done(tracker.id).await?;
        session.sync().await?;

        session.delete_category("Home").await?;

        assert!(session.categories().is_empty());
        assert!(session.ledger().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_statistics() -> Result<()> {
        let (_dir, mut session) = json_session().await?;
        assert!(session.statistics().is_empty());
        assert_eq!(session.statistics().progress, None);

        session.create_category("Home").await?;
        let daily = session
            .create_tracker(weekly("Dishes", "Home", &Weekday::ALL))
            .await?;
        session
            .create_tracker(weekly("Laundry", "Home", &[Weekday::Wednesday]))
            .await?;
        session
            .create_tracker(weekly("Sunday lunch", "Home", &[Weekday::Sunday]))
            .await?;

        session.select_date(TODAY.pred_opt().unwrap());
        session.mark_done(daily.id).await?;
        session.select_date(TODAY);
        session.mark_done(daily.id).await?;

        let statistics = session.statistics();
        assert_eq!(statistics.completed, 2);
        assert_eq!(statistics.active_days, 2);
        assert_eq!(statistics.progress.map(|p| *p), Some(50.));
        Ok(())
    }

    #[tokio::test]
    async fn test_analytics_reports() -> Result<()> {
        let dir = tempdir()?;
        let mut analytics = MockAnalytics::new();
        analytics
            .expect_report()
            .with(eq(AnalyticsEvent::open(MAIN_SCREEN)))
            .times(1)
            .return_const(());
        analytics
            .expect_report()
            .with(eq(AnalyticsEvent::click(MAIN_SCREEN, EventItem::Filter)))
            .times(1)
            .return_const(());
        analytics
            .expect_report()
            .with(eq(AnalyticsEvent::click(MAIN_SCREEN, EventItem::AddTrack)))
            .times(1)
            .return_const(());
        analytics
            .expect_report()
            .with(eq(AnalyticsEvent::click(MAIN_SCREEN, EventItem::Track)))
            .times(1)
            .return_const(());
        analytics
            .expect_report()
            .with(eq(AnalyticsEvent::close(MAIN_SCREEN)))
            .times(1)
            .return_const(());

        let mut session = session_with(
            JsonTrackerStore::new(dir.path().to_owned())?,
            Box::new(analytics),
        );
        session.load().await?;
        session.set_filter(FilterMode::NotCompleted);
        session.create_category("Home").await?;
        let tracker = session
            .create_tracker(weekly("Dishes", "Home", &Weekday::ALL))
            .await?;
        session.toggle_done(tracker.id).await?;
        session.close();
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_during_completion_is_swallowed() -> Result<()> {
        let tracker = weekly("Dishes", "Home", &Weekday::ALL).into_tracker(uuid::Uuid::new_v4());
        let category = crate::model::Category::new("Home").with_trackers(vec![tracker.clone()]);

        let mut store = MockTrackerStore::new();
        let (sender, _) = broadcast::channel(4);
        store
            .expect_subscribe()
            .returning(move || sender.subscribe());
        store
            .expect_list_categories()
            .returning(move || Ok(vec![category.clone()]));
        store
            .expect_list_completion_records()
            .returning(|| Ok(vec![]));
        store
            .expect_add_completion_record()
            .times(1)
            .returning(|_, _| Err(StoreError::Other(anyhow::anyhow!("disk full"))));

        let mut session = session_with(store, quiet_analytics());
        session.load().await?;

        assert!(session.mark_done(tracker.id).await?);
        assert!(session.is_done(tracker.id));
        Ok(())
    }
}
