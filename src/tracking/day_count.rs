use crate::services::localization::Localizer;

/// Localization key of the "N days" label.
pub const DAYS_KEY: &str = "days";

/// Label under a tracker card telling on how many days it was done.
pub fn format_day_count(count: usize, localizer: &dyn Localizer) -> String {
    localizer.pluralize(count as u64, DAYS_KEY)
}
