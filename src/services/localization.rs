use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Source of user facing text.
#[cfg_attr(test, mockall::automock)]
pub trait Localizer: Send + Sync {
    /// Text for `count` of something, in the grammatical form the locale requires.
    fn pluralize(&self, count: u64, key: &str) -> String;

    /// Plain text for `key`. Unknown keys are returned as is.
    fn lookup(&self, key: &str) -> String;
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Ru => write!(f, "ru"),
        }
    }
}

/// CLDR style plural category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralCategory {
    One,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    fn suffix(self) -> &'static str {
        match self {
            PluralCategory::One => "one",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

/// Picks the plural form of `count` for a locale.
pub fn plural_category(locale: Locale, count: u64) -> PluralCategory {
    match locale {
        Locale::En if count == 1 => PluralCategory::One,
        Locale::En => PluralCategory::Other,
        Locale::Ru => {
            let (rem10, rem100) = (count % 10, count % 100);
            if rem10 == 1 && rem100 != 11 {
                PluralCategory::One
            } else if (2..=4).contains(&rem10) && !(12..=14).contains(&rem100) {
                PluralCategory::Few
            } else {
                PluralCategory::Many
            }
        }
    }
}

const COUNT_PLACEHOLDER: &str = "{count}";

const EN: &[(&str, &str)] = &[
    ("days.one", "{count} day"),
    ("days.other", "{count} days"),
    ("section.pinned", "Pinned"),
    ("placeholder.no_trackers", "What shall we track?"),
    ("placeholder.nothing_found", "Nothing found"),
    ("filter.all", "All trackers"),
    ("filter.today", "Trackers for today"),
    ("filter.completed", "Completed"),
    ("filter.not_completed", "Not completed"),
    ("statistics.empty", "Nothing to analyze yet"),
    ("statistics.completed", "Trackers completed"),
    ("statistics.active_days", "Days with completions"),
    ("statistics.progress", "Done on the day"),
];

const RU: &[(&str, &str)] = &[
    ("days.one", "{count} день"),
    ("days.few", "{count} дня"),
    ("days.many", "{count} дней"),
    ("section.pinned", "Закреплённые"),
    ("placeholder.no_trackers", "Что будем отслеживать?"),
    ("placeholder.nothing_found", "Ничего не найдено"),
    ("filter.all", "Все трекеры"),
    ("filter.today", "Трекеры на сегодня"),
    ("filter.completed", "Завершённые"),
    ("filter.not_completed", "Не завершённые"),
    ("statistics.empty", "Анализировать пока нечего"),
    ("statistics.completed", "Трекеров завершено"),
    ("statistics.active_days", "Дней с отметками"),
    ("statistics.progress", "Выполнено за день"),
];

/// [Localizer] backed by the string tables compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLocalizer {
    locale: Locale,
}

impl BundledLocalizer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self.locale {
            Locale::En => EN,
            Locale::Ru => RU,
        }
    }

    fn find(&self, key: &str) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, text)| *text)
    }
}

impl Localizer for BundledLocalizer {
    fn pluralize(&self, count: u64, key: &str) -> String {
        let category = plural_category(self.locale, count);
        let template = [category, PluralCategory::Other, PluralCategory::Many]
            .into_iter()
            .find_map(|c| self.find(&format!("{key}.{}", c.suffix())));
        match template {
            Some(template) => template.replace(COUNT_PLACEHOLDER, &count.to_string()),
            None => {
                warn!("No plural forms for {key} in {}", self.locale);
                format!("{count} {key}")
            }
        }
    }

    fn lookup(&self, key: &str) -> String {
        match self.find(key) {
            Some(text) => text.to_string(),
            None => {
                warn!("Missing text for {key} in {}", self.locale);
                key.to_string()
            }
        }
    }
}
