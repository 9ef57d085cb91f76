//! The application layer: a [session::TrackerSession] owning the store and the services, and the
//! [module::SessionModule] event loop that feeds it commands and store notifications.

pub mod command;
pub mod module;
pub mod preferences;
pub mod session;
pub mod shutdown;
