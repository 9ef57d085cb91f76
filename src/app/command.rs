use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::{model::FilterMode, storage::TrackerStore};

use super::session::{SessionError, TrackerSession};

/// Something the user asked the running session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SelectDate(NaiveDate),
    /// Moves the selected date by this many days.
    ShiftDate(i64),
    Search(String),
    Filter(FilterMode),
    /// Tracker reference as accepted by [TrackerSession::find_tracker].
    Toggle(String),
    Pin(String),
    Reload,
}

impl<S: TrackerStore> TrackerSession<S> {
    pub async fn apply(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        match command {
            SessionCommand::SelectDate(date) => self.select_date(date),
            SessionCommand::ShiftDate(days) => {
                match self.date().checked_add_signed(Duration::days(days)) {
                    Some(date) => self.select_date(date),
                    None => warn!("Can't move {} by {days} days", self.date()),
                }
            }
            SessionCommand::Search(search) => self.set_search(search),
            SessionCommand::Filter(filter) => self.set_filter(filter),
            SessionCommand::Toggle(reference) => {
                let id = self.find_tracker(&reference)?.id;
                let done = self.toggle_done(id).await?;
                info!("Tracker {id} done on {}: {done}", self.date());
            }
            SessionCommand::Pin(reference) => {
                let id = self.find_tracker(&reference)?.id;
                self.toggle_pinned(id).await?;
            }
            SessionCommand::Reload => self.reload().await?,
        }
        Ok(())
    }
}
