use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::model::CompletionRecord;

/// In-memory view of which trackers were done on which calendar days.
///
/// There is at most one entry per tracker and day: marking a tracker twice on the same day keeps
/// a single entry. Persisting the change is up to the caller, see
/// [TrackerSession](crate::app::session::TrackerSession).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionLedger {
    days: HashMap<Uuid, BTreeSet<NaiveDate>>,
}

impl CompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the day. Returns `false` if the tracker was already done that day.
    pub fn mark_done(&mut self, tracker_id: Uuid, date: NaiveDate) -> bool {
        self.days.entry(tracker_id).or_default().insert(date)
    }

    /// Removes the day. Returns `false` if there was nothing to remove.
    pub fn mark_undone(&mut self, tracker_id: Uuid, date: NaiveDate) -> bool {
        let Some(days) = self.days.get_mut(&tracker_id) else {
            return false;
        };
        let removed = days.remove(&date);
        if days.is_empty() {
            self.days.remove(&tracker_id);
        }
        removed
    }

    pub fn is_done(&self, tracker_id: Uuid, date: NaiveDate) -> bool {
        self.days
            .get(&tracker_id)
            .is_some_and(|days| days.contains(&date))
    }

    /// Number of distinct days the tracker was done.
    pub fn count_done(&self, tracker_id: Uuid) -> usize {
        self.days.get(&tracker_id).map_or(0, BTreeSet::len)
    }

    /// Drops every record of a tracker. Used when the tracker itself goes away.
    pub fn forget(&mut self, tracker_id: Uuid) {
        self.days.remove(&tracker_id);
    }

    /// Total number of completions across all trackers.
    pub fn len(&self) -> usize {
        self.days.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Distinct days on which at least one tracker was done.
    pub fn days_with_completions(&self) -> BTreeSet<NaiveDate> {
        self.days.values().flatten().copied().collect()
    }

    pub fn records(&self) -> impl Iterator<Item = CompletionRecord> + '_ {
        self.days.iter().flat_map(|(tracker_id, days)| {
            days.iter().map(|date| CompletionRecord {
                tracker_id: *tracker_id,
                date: *date,
            })
        })
    }
}

impl FromIterator<CompletionRecord> for CompletionLedger {
    fn from_iter<T: IntoIterator<Item = CompletionRecord>>(iter: T) -> Self {
        let mut ledger = CompletionLedger::new();
        for record in iter {
            ledger.mark_done(record.tracker_id, record.date);
        }
        ledger
    }
}
