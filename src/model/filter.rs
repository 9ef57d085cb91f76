use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Which trackers the main list shows. The selection is remembered between runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    All,
    Today,
    Completed,
    NotCompleted,
}

impl FilterMode {
    /// Key used to look up the user facing name of the filter.
    pub fn title_key(self) -> &'static str {
        match self {
            FilterMode::All => "filter.all",
            FilterMode::Today => "filter.today",
            FilterMode::Completed => "filter.completed",
            FilterMode::NotCompleted => "filter.not_completed",
        }
    }
}

impl Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::All => write!(f, "all"),
            FilterMode::Today => write!(f, "today"),
            FilterMode::Completed => write!(f, "completed"),
            FilterMode::NotCompleted => write!(f, "not-completed"),
        }
    }
}
