use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{fs::File, sync::broadcast};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    fs::operations::{append_json_line, read_json, read_json_lines, to_json_lines, write_atomically},
    model::{Category, CompletionRecord, Tracker, TrackerDraft},
};

use super::{
    entities::{CatalogEntity, CategoryEntity, TrackerEntity},
    error::StoreError,
    tracker_store::{StoreEvent, TrackerStore},
};

const CATALOG_FILE: &str = "catalog.json";
const RECORDS_FILE: &str = "records.jsonl";
const LOCK_FILE: &str = ".lock";
const EVENT_CAPACITY: usize = 32;

/// The main realization of [TrackerStore]. Keeps a directory with:
///  - `catalog.json`: categories with their trackers, rewritten as a whole on every change.
///  - `records.jsonl`: completion records, one per line.
///
/// Every operation holds a lock on a separate lock file, so several processes can share the
/// directory.
pub struct JsonTrackerStore {
    dir: PathBuf,
    events: broadcast::Sender<StoreEvent>,
}

impl JsonTrackerStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self { dir, events })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The lock is held until the returned handle is dropped.
    async fn lock(&self, exclusive: bool) -> Result<File, StoreError> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE))
            .await?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(file)
    }

    async fn read_catalog(&self) -> Result<CatalogEntity, StoreError> {
        Ok(read_json(&self.dir.join(CATALOG_FILE)).await?)
    }

    async fn write_catalog(&self, catalog: &CatalogEntity) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(catalog)?;
        write_atomically(&self.dir.join(CATALOG_FILE), &data).await?;
        Ok(())
    }

    async fn read_records(&self) -> Result<Vec<CompletionRecord>, StoreError> {
        Ok(read_json_lines(&self.dir.join(RECORDS_FILE)).await?)
    }

    async fn write_records(&self, records: &[CompletionRecord]) -> Result<(), StoreError> {
        let data = to_json_lines(records)?;
        write_atomically(&self.dir.join(RECORDS_FILE), &data).await?;
        Ok(())
    }

    /// Drops records of the given trackers. Returns whether anything was removed.
    async fn purge_records(&self, tracker_ids: &[Uuid]) -> Result<bool, StoreError> {
        if tracker_ids.is_empty() {
            return Ok(false);
        }
        let mut records = self.read_records().await?;
        let before = records.len();
        records.retain(|r| !tracker_ids.contains(&r.tracker_id));
        if records.len() == before {
            return Ok(false);
        }
        self.write_records(&records).await?;
        Ok(true)
    }

    fn notify(&self, event: StoreEvent) {
        // Sending only fails when nobody listens
        if self.events.send(event).is_err() {
            debug!("No subscribers for {event:?}");
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<String, StoreError> {
    let value = value.trim();
    if value.is_empty() {
        Err(StoreError::EmptyField(field))
    } else {
        Ok(value.to_string())
    }
}

fn validated_entity(tracker: &Tracker) -> Result<TrackerEntity, StoreError> {
    required(&tracker.name, "tracker name")?;
    required(&tracker.emoji, "emoji")?;
    let mut entity = TrackerEntity::from_tracker(tracker)?;
    entity.name = entity.name.trim().to_string();
    Ok(entity)
}

#[async_trait]
impl TrackerStore for JsonTrackerStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let _lock = self.lock(false).await?;
        Ok(self.read_catalog().await?.into_categories())
    }

    #[instrument(skip(self))]
    async fn create_category(&self, name: &str) -> Result<(), StoreError> {
        let name = required(name, "category name")?;
        let _lock = self.lock(true).await?;
        let mut catalog = self.read_catalog().await?;
        if catalog.category(&name).is_some() {
            return Err(StoreError::DuplicateCategory(name));
        }
        catalog.categories.push(CategoryEntity::new(name));
        self.write_catalog(&catalog).await?;
        info!("Category created");
        self.notify(StoreEvent::Categories);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn rename_category(&self, old_name: &str, new_name: &str) -> Result<(), StoreError> {
        let old_name = old_name.trim();
        let new_name = required(new_name, "category name")?;
        let _lock = self.lock(true).await?;
        let mut catalog = self.read_catalog().await?;
        if new_name != old_name && catalog.category(&new_name).is_some() {
            return Err(StoreError::DuplicateCategory(new_name));
        }
        let category = catalog
            .category_mut(old_name)
            .ok_or_else(|| StoreError::CategoryNotFound(old_name.to_string()))?;
        category.name = new_name;
        self.write_catalog(&catalog).await?;
        info!("Category renamed");
        self.notify(StoreEvent::Categories);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, name: &str) -> Result<(), StoreError> {
        let name = name.trim();
        let _lock = self.lock(true).await?;
        let mut catalog = self.read_catalog().await?;
        let index = catalog
            .categories
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| StoreError::CategoryNotFound(name.to_string()))?;
        let removed = catalog.categories.remove(index);
        self.write_catalog(&catalog).await?;

        let tracker_ids = removed.trackers.iter().map(|t| t.id).collect::<Vec<_>>();
        let records_removed = self.purge_records(&tracker_ids).await?;
        info!("Category deleted with {} trackers", tracker_ids.len());

        self.notify(StoreEvent::Categories);
        if !tracker_ids.is_empty() {
            self.notify(StoreEvent::Trackers);
        }
        if records_removed {
            self.notify(StoreEvent::Records);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_tracker(&self, draft: TrackerDraft) -> Result<Tracker, StoreError> {
        let tracker = draft.into_tracker(Uuid::new_v4());
        let entity = validated_entity(&tracker)?;
        let _lock = self.lock(true).await?;
        let mut catalog = self.read_catalog().await?;
        let category = catalog
            .category_mut(&tracker.category)
            .ok_or_else(|| StoreError::CategoryNotFound(tracker.category.clone()))?;
        category.trackers.push(entity);
        self.write_catalog(&catalog).await?;
        info!("Tracker {} created", tracker.id);
        self.notify(StoreEvent::Trackers);
        Ok(tracker)
    }

    #[instrument(skip(self), fields(id = %tracker.id))]
    async fn update_tracker(&self, mut tracker: Tracker) -> Result<(), StoreError> {
        tracker.category = tracker.category.trim().to_string();
        let entity = validated_entity(&tracker)?;
        let _lock = self.lock(true).await?;
        let mut catalog = self.read_catalog().await?;
        if catalog.category(&tracker.category).is_none() {
            return Err(StoreError::CategoryNotFound(tracker.category));
        }
        let (ci, ti) = catalog
            .locate(tracker.id)
            .ok_or(StoreError::TrackerNotFound(tracker.id))?;
        let Some(current) = catalog.categories.get_mut(ci) else {
            return Err(StoreError::TrackerNotFound(tracker.id));
        };

        if current.name == tracker.category {
            if let Some(slot) = current.trackers.get_mut(ti) {
                *slot = entity;
            }
        } else {
            current.trackers.remove(ti);
            if let Some(target) = catalog.category_mut(&tracker.category) {
                target.trackers.push(entity);
            }
        }
        self.write_catalog(&catalog).await?;
        info!("Tracker updated");
        self.notify(StoreEvent::Trackers);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_tracker(&self, id: Uuid) -> Result<(), StoreError> {
        let _lock = self.lock(true).await?;
        let mut catalog = self.read_catalog().await?;
        let (ci, ti) = catalog.locate(id).ok_or(StoreError::TrackerNotFound(id))?;
        if let Some(category) = catalog.categories.get_mut(ci) {
            category.trackers.remove(ti);
        }
        self.write_catalog(&catalog).await?;
        let records_removed = self.purge_records(&[id]).await?;
        info!("Tracker deleted");

        self.notify(StoreEvent::Trackers);
        if records_removed {
            self.notify(StoreEvent::Records);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn toggle_pinned(&self, id: Uuid) -> Result<bool, StoreError> {
        let _lock = self.lock(true).await?;
        let mut catalog = self.read_catalog().await?;
        let tracker = catalog
            .tracker_mut(id)
            .ok_or(StoreError::TrackerNotFound(id))?;
        tracker.is_pinned = !tracker.is_pinned;
        let pinned = tracker.is_pinned;
        self.write_catalog(&catalog).await?;
        info!("Tracker pinned: {pinned}");
        self.notify(StoreEvent::Trackers);
        Ok(pinned)
    }

    async fn list_completion_records(&self) -> Result<Vec<CompletionRecord>, StoreError> {
        let _lock = self.lock(false).await?;
        self.read_records().await
    }

    #[instrument(skip(self))]
    async fn add_completion_record(
        &self,
        tracker_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let _lock = self.lock(true).await?;
        let record = CompletionRecord { tracker_id, date };
        if self.read_records().await?.contains(&record) {
            debug!("Record already present");
            return Ok(false);
        }
        append_json_line(&self.dir.join(RECORDS_FILE), &record).await?;
        self.notify(StoreEvent::Records);
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn remove_completion_record(
        &self,
        tracker_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let _lock = self.lock(true).await?;
        let mut records = self.read_records().await?;
        let before = records.len();
        records.retain(|r| !(r.tracker_id == tracker_id && r.date == date));
        if records.len() == before {
            debug!("No record to remove");
            return Ok(false);
        }
        self.write_records(&records).await?;
        self.notify(StoreEvent::Records);
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
