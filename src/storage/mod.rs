//! Storage is organized through [json_store::JsonTrackerStore].
//! The basic idea is:
//!  - There is an application directory with a catalog file and a records file.
//!  - The catalog holds categories and their trackers and is always rewritten as a whole.
//!  - Completion records are appended one per line.
//!  - Every successful mutation is announced through [tracker_store::StoreEvent].

pub mod entities;
pub mod error;
pub mod json_store;
pub mod tracker_store;

pub use error::StoreError;
pub use json_store::JsonTrackerStore;
pub use tracker_store::{StoreEvent, TrackerStore};

#[cfg(test)]
pub use tracker_store::MockTrackerStore;
