use std::fmt::Display;

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Open,
    Close,
    Click,
}

/// Element of the screen the user interacted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventItem {
    AddTrack,
    Track,
    Filter,
    Edit,
    Delete,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Open => write!(f, "open"),
            EventKind::Close => write!(f, "close"),
            EventKind::Click => write!(f, "click"),
        }
    }
}

impl Display for EventItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventItem::AddTrack => write!(f, "add_track"),
            EventItem::Track => write!(f, "track"),
            EventItem::Filter => write!(f, "filter"),
            EventItem::Edit => write!(f, "edit"),
            EventItem::Delete => write!(f, "delete"),
        }
    }
}

pub const MAIN_SCREEN: &str = "Main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsEvent {
    pub event: EventKind,
    pub screen: &'static str,
    pub item: Option<EventItem>,
}

impl AnalyticsEvent {
    pub fn open(screen: &'static str) -> Self {
        Self {
            event: EventKind::Open,
            screen,
            item: None,
        }
    }

    pub fn close(screen: &'static str) -> Self {
        Self {
            event: EventKind::Close,
            screen,
            item: None,
        }
    }

    pub fn click(screen: &'static str, item: EventItem) -> Self {
        Self {
            event: EventKind::Click,
            screen,
            item: Some(item),
        }
    }
}

/// Fire and forget reporting of user interactions.
#[cfg_attr(test, mockall::automock)]
pub trait Analytics: Send + Sync {
    fn report(&self, event: &AnalyticsEvent);
}

/// Writes every event into the log. There is no remote backend.
#[derive(Debug, Default)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn report(&self, event: &AnalyticsEvent) {
        match event.item {
            Some(item) => info!(
                target: "habitrack::analytics",
                event = %event.event,
                screen = event.screen,
                item = %item,
                "Analytics event"
            ),
            None => info!(
                target: "habitrack::analytics",
                event = %event.event,
                screen = event.screen,
                "Analytics event"
            ),
        }
    }
}
