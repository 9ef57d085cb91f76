//! Domain types of the tracker: [Tracker]s grouped into [Category]s, their [Schedule]s and the
//! [CompletionRecord]s that mark them as done.

pub mod color;
pub mod filter;
pub mod schedule;
pub mod tracker;

pub use color::Rgb;
pub use filter::FilterMode;
pub use schedule::{Schedule, Weekday, WeekdaySet};
pub use tracker::{find_tracker, Category, CompletionRecord, Tracker, TrackerDraft};
