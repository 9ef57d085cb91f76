use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::model::{Category, CompletionRecord, Tracker, TrackerDraft};

use super::error::StoreError;

/// Sent to subscribers after a mutation went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Categories,
    Trackers,
    Records,
}

/// Interface for abstracting durable storage of categories, trackers and completion records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// All categories with their trackers, in stored order.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn create_category(&self, name: &str) -> Result<(), StoreError>;

    async fn rename_category(&self, old_name: &str, new_name: &str) -> Result<(), StoreError>;

    /// Deletes the category together with its trackers and their completion records.
    async fn delete_category(&self, name: &str) -> Result<(), StoreError>;

    async fn create_tracker(&self, draft: TrackerDraft) -> Result<Tracker, StoreError>;

    /// Replaces the stored fields of an existing tracker. Changing `category` moves it.
    async fn update_tracker(&self, tracker: Tracker) -> Result<(), StoreError>;

    /// Deletes the tracker and its completion records.
    async fn delete_tracker(&self, id: Uuid) -> Result<(), StoreError>;

    /// Flips the pinned flag and returns the new value.
    async fn toggle_pinned(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_completion_records(&self) -> Result<Vec<CompletionRecord>, StoreError>;

    /// Returns `false` when the record was already there.
    async fn add_completion_record(
        &self,
        tracker_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, StoreError>;

    /// Returns `false` when there was nothing to remove.
    async fn remove_completion_record(
        &self,
        tracker_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, StoreError>;

    /// Notifications about changes made through this store.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
