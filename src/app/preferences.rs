use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    fs::operations::{read_json, write_atomically},
    model::FilterMode,
    services::localization::Locale,
};

const PREFERENCES_FILE: &str = "preferences.json";

/// Choices that survive between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub filter: FilterMode,
    pub locale: Locale,
}

impl Preferences {
    /// Missing or unreadable preferences are replaced by the defaults.
    pub async fn load(dir: &Path) -> Self {
        match read_json(&dir.join(PREFERENCES_FILE)).await {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!("Failed to read preferences, using defaults: {e:?}");
                Self::default()
            }
        }
    }

    pub async fn save(&self, dir: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        write_atomically(&dir.join(PREFERENCES_FILE), &data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{model::FilterMode, services::localization::Locale};

    use super::{Preferences, PREFERENCES_FILE};

    #[tokio::test]
    async fn test_preferences_survive_restart() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(Preferences::load(dir.path()).await, Preferences::default());

        let preferences = Preferences {
            filter: FilterMode::NotCompleted,
            locale: Locale::Ru,
        };
        preferences.save(dir.path()).await?;

        assert_eq!(Preferences::load(dir.path()).await, preferences);
        Ok(())
    }

    #[tokio::test]
    async fn test_broken_preferences_fall_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join(PREFERENCES_FILE), "{\"filter\": 12")?;
        assert_eq!(Preferences::load(dir.path()).await, Preferences::default());

        std::fs::write(dir.path().join(PREFERENCES_FILE), "{\"locale\": \"ru\"}")?;
        let partial = Preferences::load(dir.path()).await;
        assert_eq!(partial.locale, Locale::Ru);
        assert_eq!(partial.filter, FilterMode::All);
        Ok(())
    }
}
