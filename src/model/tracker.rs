use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{color::Rgb, schedule::Schedule};

/// A habit or an irregular event the user wants to mark as done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: Uuid,
    pub name: String,
    pub color: Rgb,
    pub emoji: String,
    pub schedule: Schedule,
    #[serde(default)]
    pub is_pinned: bool,
    /// Name of the owning [Category].
    pub category: String,
}

impl Tracker {
    pub fn is_scheduled_on(&self, date: NaiveDate) -> bool {
        self.schedule.is_due_on(date)
    }

    /// First 8 characters of the id. Enough to reference a tracker from the command line.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// Fields of a tracker that is about to be created. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerDraft {
    pub name: String,
    pub color: Rgb,
    pub emoji: String,
    pub schedule: Schedule,
    pub category: String,
}

impl TrackerDraft {
    pub fn into_tracker(self, id: Uuid) -> Tracker {
        let TrackerDraft {
            name,
            color,
            emoji,
            schedule,
            category,
        } = self;
        Tracker {
            id,
            name: name.trim().to_string(),
            color,
            emoji,
            schedule,
            is_pinned: false,
            category: category.trim().to_string(),
        }
    }
}

/// Named group of trackers. Names are unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub trackers: Vec<Tracker>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trackers: vec![],
        }
    }

    pub fn with_trackers(self, trackers: Vec<Tracker>) -> Self {
        Self { trackers, ..self }
    }
}

/// Finds a tracker by id across all categories.
pub fn find_tracker(categories: &[Category], id: Uuid) -> Option<&Tracker> {
    categories
        .iter()
        .flat_map(|category| category.trackers.iter())
        .find(|tracker| tracker.id == id)
}

/// Evidence of a tracker being done on a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub tracker_id: Uuid,
    pub date: NaiveDate,
}
