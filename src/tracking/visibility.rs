use chrono::NaiveDate;
use tracing::{instrument, trace};

use crate::model::{Category, FilterMode, Tracker};

use super::ledger::CompletionLedger;

/// State of the main screen that decides what is shown.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityQuery<'a> {
    pub date: NaiveDate,
    pub mode: FilterMode,
    pub search: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTitle<'a> {
    /// Synthetic group holding pinned trackers of every category.
    Pinned,
    Category(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSection<'a> {
    pub title: SectionTitle<'a>,
    pub trackers: Vec<&'a Tracker>,
}

/// Grouped list of trackers ready to be rendered. Sections are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleTrackers<'a> {
    pub sections: Vec<TrackerSection<'a>>,
}

impl VisibleTrackers<'_> {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn tracker_count(&self) -> usize {
        self.sections.iter().map(|s| s.trackers.len()).sum()
    }

    pub fn trackers(&self) -> impl Iterator<Item = &Tracker> {
        self.sections
            .iter()
            .flat_map(|s| s.trackers.iter().copied())
    }
}

/// Why nothing is shown. The two cases have different placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The user has not created a single tracker yet.
    NoTrackers,
    /// Trackers exist, but the date, filter or search excluded all of them.
    NothingFound,
}

impl EmptyState {
    pub fn message_key(self) -> &'static str {
        match self {
            EmptyState::NoTrackers => "placeholder.no_trackers",
            EmptyState::NothingFound => "placeholder.nothing_found",
        }
    }
}

/// Computes which trackers are visible for the query.
///
/// Pinned trackers that are scheduled for the date go first in their own section, regardless of
/// the filter and the search. The remaining trackers keep their category and order:
///  - [FilterMode::Completed] shows trackers done on the date, scheduled or not.
///  - [FilterMode::NotCompleted] shows scheduled trackers that are not done.
///  - otherwise scheduled trackers are shown, narrowed by the search text when there is one.
///
/// Categories left without trackers are dropped.
#[instrument(level = "trace", skip(categories, ledger))]
pub fn visible_trackers<'a>(
    categories: &'a [Category],
    ledger: &CompletionLedger,
    query: &VisibilityQuery<'_>,
) -> VisibleTrackers<'a> {
    let pinned = categories
        .iter()
        .flat_map(|category| category.trackers.iter())
        .filter(|tracker| tracker.is_pinned && tracker.is_scheduled_on(query.date))
        .collect::<Vec<_>>();

    let mut sections = vec![];
    if !pinned.is_empty() {
        sections.push(TrackerSection {
            title: SectionTitle::Pinned,
            trackers: pinned,
        });
    }

    for category in categories {
        let trackers = category
            .trackers
            .iter()
            .filter(|tracker| !tracker.is_pinned && is_included(tracker, ledger, query))
            .collect::<Vec<_>>();
        trace!("{} has {} visible trackers", category.name, trackers.len());
        if !trackers.is_empty() {
            sections.push(TrackerSection {
                title: SectionTitle::Category(&category.name),
                trackers,
            });
        }
    }

    VisibleTrackers { sections }
}

fn is_included(tracker: &Tracker, ledger: &CompletionLedger, query: &VisibilityQuery<'_>) -> bool {
    let scheduled = tracker.is_scheduled_on(query.date);
    match query.mode {
        // Completed trackers are listed even if they were not due on the date.
        FilterMode::Completed => ledger.is_done(tracker.id, query.date),
        FilterMode::NotCompleted => scheduled && !ledger.is_done(tracker.id, query.date),
        FilterMode::All | FilterMode::Today if !query.search.is_empty() => {
            scheduled && tracker.name.contains(query.search)
        }
        FilterMode::All | FilterMode::Today => scheduled,
    }
}

/// Picks the placeholder for an empty list, or `None` when there is something to show.
pub fn empty_state(categories: &[Category], visible: &VisibleTrackers<'_>) -> Option<EmptyState> {
    if !visible.is_empty() {
        None
    } else if categories.iter().all(|c| c.trackers.is_empty()) {
        Some(EmptyState::NoTrackers)
    } else {
        Some(EmptyState::NothingFound)
    }
}
