use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::storage::{StoreEvent, TrackerStore};

use super::{command::SessionCommand, session::TrackerSession};

enum Step {
    Stop,
    Command(SessionCommand),
    Changed(StoreEvent),
}

/// Drives a [TrackerSession]: applies commands and store notifications one at a time and renders
/// the session after every step.
pub struct SessionModule<S, R> {
    session: TrackerSession<S>,
    commands: mpsc::Receiver<SessionCommand>,
    shutdown: CancellationToken,
    renderer: R,
}

impl<S, R> SessionModule<S, R>
where
    S: TrackerStore,
    R: FnMut(&TrackerSession<S>),
{
    pub fn new(
        session: TrackerSession<S>,
        commands: mpsc::Receiver<SessionCommand>,
        shutdown: CancellationToken,
        renderer: R,
    ) -> Self {
        Self {
            session,
            commands,
            shutdown,
            renderer,
        }
    }

    /// Executes the session event loop. Stops on cancellation or when every command sender is
    /// gone, and hands the session back.
    pub async fn run(mut self) -> Result<TrackerSession<S>> {
        (self.renderer)(&self.session);
        loop {
            let step = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Step::Stop,
                command = self.commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Stop,
                },
                event = self.session.next_change() => Step::Changed(event),
            };

            match step {
                Step::Stop => break,
                Step::Command(command) => {
                    debug!("Applying {command:?}");
                    if let Err(e) = self.session.apply(command).await {
                        error!("Command failed: {e}");
                    }
                }
                Step::Changed(event) => {
                    debug!("Store changed: {event:?}");
                    // The received event is already consumed, so reload even when nothing else
                    // is pending.
                    let result = match self.session.sync().await {
                        Ok(false) => self.session.reload().await,
                        other => other.map(|_| ()),
                    };
                    if let Err(e) = result {
                        error!("Failed to reload after {event:?}: {e}");
                    }
                }
            }
            (self.renderer)(&self.session);
        }

        info!("Session finished");
        self.commands.close();
        self.session.close();
        Ok(self.session)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        app::{command::SessionCommand, session::TrackerSession},
        model::{FilterMode, Rgb, Schedule, TrackerDraft, Weekday},
        services::{
            analytics::MockAnalytics,
            localization::{BundledLocalizer, Locale},
        },
        storage::JsonTrackerStore,
        utils::{clock::FixedClock, logging::TEST_LOGGING},
    };

    use super::SessionModule;

    const TODAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();

    async fn prepared_session(
        dir: &std::path::Path,
    ) -> Result<TrackerSession<JsonTrackerStore>> {
        let mut analytics = MockAnalytics::new();
        analytics.expect_report().return_const(());
        let mut session = TrackerSession::new(
            JsonTrackerStore::new(dir.to_owned())?,
            Box::new(analytics),
            Box::new(BundledLocalizer::new(Locale::En)),
            Box::new(FixedClock::on(TODAY)),
        );
        session.load().await?;
        session.create_category("Home").await?;
        session
            .create_tracker(TrackerDraft {
                name: "Dishes".into(),
                color: Rgb::WHITE,
                emoji: "🍽".into(),
                schedule: Schedule::Weekly(Weekday::ALL.into_iter().collect()),
                category: "Home".into(),
            })
            .await?;
        Ok(session)
    }

    #[tokio::test]
    async fn test_commands_are_applied_in_order() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let session = prepared_session(dir.path()).await?;

        let (sender, receiver) = mpsc::channel(8);
        let mut renders = 0;
        let module = SessionModule::new(session, receiver, CancellationToken::new(), |_| {
            renders += 1
        });

        sender.send(SessionCommand::Toggle("Dishes".into())).await?;
        sender.send(SessionCommand::ShiftDate(-1)).await?;
        sender.send(SessionCommand::Toggle("Dishes".into())).await?;
        sender
            .send(SessionCommand::Filter(FilterMode::Completed))
            .await?;
        // failures are logged and the loop goes on
        sender.send(SessionCommand::Toggle("Unknown".into())).await?;
        sender.send(SessionCommand::Search("Dish".into())).await?;
        drop(sender);

        let session = module.run().await?;

        assert_eq!(session.ledger().len(), 2);
        assert_eq!(session.date(), TODAY.pred_opt().unwrap());
        assert_eq!(session.filter(), FilterMode::Completed);
        assert_eq!(session.search(), "Dish");
        assert_eq!(session.visible().tracker_count(), 1);
        assert!(renders >= 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_loop() -> Result<()> {
        let dir = tempdir()?;
        let session = prepared_session(dir.path()).await?;

        let (_sender, receiver) = mpsc::channel(8);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let session = SessionModule::new(session, receiver, shutdown, |_| ())
            .run()
            .await?;
        assert!(session.ledger().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_today_filter_jumps_back() -> Result<()> {
        let dir = tempdir()?;
        let session = prepared_session(dir.path()).await?;

        let (sender, receiver) = mpsc::channel(8);
        sender.send(SessionCommand::ShiftDate(-3)).await?;
        sender
            .send(SessionCommand::Filter(FilterMode::Today))
            .await?;
        drop(sender);

        let session = SessionModule::new(session, receiver, CancellationToken::new(), |_| ())
            .run()
            .await?;
        assert_eq!(session.date(), TODAY);
        Ok(())
    }
}
