//! Habit and event tracker for the terminal. Trackers are grouped into categories, repeat on
//! weekdays or happen on a single day, and are marked as done day by day.
//!

pub mod app;
pub mod cli;
pub mod fs;
pub mod model;
pub mod services;
pub mod storage;
pub mod tracking;
pub mod utils;
