use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Category {0:?} does not exist")]
    CategoryNotFound(String),
    #[error("Tracker {0} does not exist")]
    TrackerNotFound(Uuid),
    #[error("Category {0:?} already exists")]
    DuplicateCategory(String),
    #[error("The {0} must not be empty")]
    EmptyField(&'static str),
    #[error("Tracker {0} has neither weekdays nor a date")]
    MissingSchedule(Uuid),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::CategoryNotFound(_) | StoreError::TrackerNotFound(_)
        )
    }
}
