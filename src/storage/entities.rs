use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::model::{Category, Rgb, Schedule, Tracker, WeekdaySet};

use super::error::StoreError;

/// Contents of the catalog file: every category with its trackers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntity {
    #[serde(default)]
    pub categories: Vec<CategoryEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntity {
    pub name: String,
    #[serde(default)]
    pub trackers: Vec<TrackerEntity>,
}

/// The struct used for storing a tracker on disk. A habit keeps its weekdays as an encoded
/// string in `calendar`, an irregular event keeps its day in `date`. Exactly one of them is
/// expected to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerEntity {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub is_pinned: bool,
}

impl TrackerEntity {
    pub fn from_tracker(tracker: &Tracker) -> Result<Self, serde_json::Error> {
        let (calendar, date) = match tracker.schedule {
            Schedule::Weekly(days) => (Some(serde_json::to_string(&days)?), None),
            Schedule::OnDate(day) => (None, Some(day)),
        };
        Ok(Self {
            id: tracker.id,
            name: tracker.name.clone(),
            color: tracker.color.to_hex(),
            emoji: tracker.emoji.clone(),
            calendar,
            date,
            is_pinned: tracker.is_pinned,
        })
    }

    /// Restores the tracker. Weekdays that can't be decoded become an empty set rather than
    /// failing the whole load.
    pub fn into_tracker(self, category: &str) -> Result<Tracker, StoreError> {
        let TrackerEntity {
            id,
            name,
            color,
            emoji,
            calendar,
            date,
            is_pinned,
        } = self;

        let schedule = match (calendar, date) {
            (None, Some(day)) => Schedule::OnDate(day),
            (Some(_), Some(day)) => {
                warn!("Tracker {id} has both weekdays and a date, keeping the date");
                Schedule::OnDate(day)
            }
            (Some(calendar), None) => match serde_json::from_str::<WeekdaySet>(&calendar) {
                Ok(days) => Schedule::Weekly(days),
                Err(e) => {
                    warn!("Failed to decode weekdays {calendar:?} of tracker {id}: {e}");
                    Schedule::Weekly(WeekdaySet::EMPTY)
                }
            },
            (None, None) => return Err(StoreError::MissingSchedule(id)),
        };

        Ok(Tracker {
            id,
            name,
            color: Rgb::from_hex(&color),
            emoji,
            schedule,
            is_pinned,
            category: category.to_string(),
        })
    }
}

impl CategoryEntity {
    pub fn new(name: String) -> Self {
        Self {
            name,
            trackers: vec![],
        }
    }

    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.trackers.iter().position(|t| t.id == id)
    }
}

impl CatalogEntity {
    pub fn category(&self, name: &str) -> Option<&CategoryEntity> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_mut(&mut self, name: &str) -> Option<&mut CategoryEntity> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    /// Finds the tracker, returning the index of its category and its index inside it.
    pub fn locate(&self, id: Uuid) -> Option<(usize, usize)> {
        self.categories
            .iter()
            .enumerate()
            .find_map(|(ci, category)| category.position_of(id).map(|ti| (ci, ti)))
    }

    pub fn tracker_mut(&mut self, id: Uuid) -> Option<&mut TrackerEntity> {
        let (ci, ti) = self.locate(id)?;
        self.categories.get_mut(ci)?.trackers.get_mut(ti)
    }

    /// Converts into domain categories. Trackers without any schedule are skipped; they can only
    /// come from a broken file.
    pub fn into_categories(self) -> Vec<Category> {
        self.categories
            .into_iter()
            .map(|category| {
                let trackers = category
                    .trackers
                    .into_iter()
                    .filter_map(|entity| match entity.into_tracker(&category.name) {
                        Ok(tracker) => Some(tracker),
                        Err(e) => {
                            error!("Skipping stored tracker: {e}");
                            debug_assert!(false, "stored tracker violates invariants: {e}");
                            None
                        }
                    })
                    .collect();
                Category {
                    name: category.name,
                    trackers,
                }
            })
            .collect()
    }
}
