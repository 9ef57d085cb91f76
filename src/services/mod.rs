//! Collaborators the session talks to but does not own the logic of: analytics reporting and
//! localized text.

pub mod analytics;
pub mod localization;
