use chrono::{DateTime, Local, NaiveDate};

/// Represents an entity responsible for providing dates across application. This allows tests to
/// pin "today" to a fixed day.
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Local>;

    /// The current calendar day in the local time zone.
    fn today(&self) -> NaiveDate {
        self.time().date_naive()
    }
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always returns the same moment.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl FixedClock {
    /// Midday of the given day, so time zone shifts can't move it to a neighbouring day.
    pub fn on(day: NaiveDate) -> Self {
        let midday = day.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self(
            midday
                .and_local_timezone(Local)
                .earliest()
                .unwrap_or_else(Local::now),
        )
    }
}

impl Clock for FixedClock {
    fn time(&self) -> DateTime<Local> {
        self.0
    }
}
