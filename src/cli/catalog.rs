use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use clap::{Args, Subcommand};

use crate::{
    app::session::TrackerSession,
    model::{Rgb, Schedule, TrackerDraft, WeekdaySet},
    storage::TrackerStore,
};

use super::{
    dates::{parse_day, DateStyle},
    render::render_categories,
};

const DEFAULT_COLOR: &str = "#33CF69";
const DEFAULT_EMOJI: &str = "⭐";

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    #[command(about = "List categories with their trackers")]
    List,
    #[command(about = "Create an empty category")]
    Add { name: String },
    #[command(about = "Rename a category. Its trackers move along")]
    Rename { old_name: String, new_name: String },
    #[command(about = "Delete a category together with its trackers and their history")]
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum TrackerCommand {
    #[command(about = "Create a habit repeated on weekdays or an event on a single day")]
    Add {
        name: String,
        #[arg(long, short)]
        category: String,
        #[arg(long, short, default_value = DEFAULT_EMOJI)]
        emoji: String,
        #[arg(
            long,
            default_value = DEFAULT_COLOR,
            value_parser = parse_color,
            help = "Colour as #RRGGBB"
        )]
        color: Rgb,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    #[command(about = "Change fields of a tracker. Missing options keep their value")]
    Edit {
        #[arg(help = "Tracker id, id prefix or name")]
        tracker: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long, short)]
        emoji: Option<String>,
        #[arg(long, value_parser = parse_color)]
        color: Option<Rgb>,
        #[arg(
            long,
            conflicts_with = "on",
            help = "Weekdays, e.g. \"mon,wed,fri\", \"weekdays\" or \"daily\""
        )]
        days: Option<WeekdaySet>,
        #[arg(long, help = "The single day of an irregular event")]
        on: Option<String>,
    },
    #[command(about = "Delete a tracker and its history")]
    Delete {
        #[arg(help = "Tracker id, id prefix or name")]
        tracker: String,
    },
    #[command(about = "Pin or unpin a tracker. Pinned trackers are listed first")]
    Pin {
        #[arg(help = "Tracker id, id prefix or name")]
        tracker: String,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ScheduleArgs {
    #[arg(long, help = "Weekdays, e.g. \"mon,wed,fri\", \"weekdays\" or \"daily\"")]
    days: Option<WeekdaySet>,
    #[arg(long, help = "The single day of an irregular event")]
    on: Option<String>,
}

fn parse_color(value: &str) -> Result<Rgb, String> {
    Rgb::parse_hex(value).ok_or_else(|| format!("{value:?} is not a #RRGGBB colour"))
}

fn schedule_of(
    days: Option<WeekdaySet>,
    on: Option<&str>,
    style: DateStyle,
    now: DateTime<Local>,
) -> Result<Option<Schedule>> {
    Ok(match (days, on) {
        (_, Some(on)) => Some(Schedule::OnDate(parse_day(on, style, now)?)),
        (Some(days), None) => Some(Schedule::Weekly(days)),
        (None, None) => None,
    })
}

pub async fn process_category_command<S: TrackerStore>(
    session: &mut TrackerSession<S>,
    command: CategoryCommand,
) -> Result<()> {
    match command {
        CategoryCommand::List => {
            print!(
                "{}",
                render_categories(session.categories(), session.localizer())
            );
        }
        CategoryCommand::Add { name } => {
            session.create_category(&name).await?;
            println!("Created {}", name.trim());
        }
        CategoryCommand::Rename { old_name, new_name } => {
            session.rename_category(&old_name, &new_name).await?;
            println!("Renamed {} to {}", old_name.trim(), new_name.trim());
        }
        CategoryCommand::Delete { name } => {
            let name = name.trim();
            let trackers = session
                .categories()
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.trackers.len())
                .unwrap_or_default();
            session.delete_category(name).await?;
            println!("Deleted {name} with {trackers} trackers");
        }
    }
    Ok(())
}

pub async fn process_tracker_command<S: TrackerStore>(
    session: &mut TrackerSession<S>,
    command: TrackerCommand,
    style: DateStyle,
    now: DateTime<Local>,
) -> Result<()> {
    match command {
        TrackerCommand::Add {
            name,
            category,
            emoji,
            color,
            schedule,
        } => {
            let schedule = schedule_of(schedule.days, schedule.on.as_deref(), style, now)?
                .ok_or_else(|| anyhow!("A tracker needs either --days or --on"))?;
            let tracker = session
                .create_tracker(TrackerDraft {
                    name,
                    color,
                    emoji,
                    schedule,
                    category,
                })
                .await?;
            println!(
                "Created {} {} ({}), {}",
                tracker.emoji,
                tracker.name,
                tracker.short_id(),
                tracker.schedule
            );
        }
        TrackerCommand::Edit {
            tracker,
            name,
            category,
            emoji,
            color,
            days,
            on,
        } => {
            let mut tracker = session.find_tracker(&tracker)?.clone();
            if let Some(name) = name {
                tracker.name = name;
            }
            if let Some(category) = category {
                tracker.category = category;
            }
            if let Some(emoji) = emoji {
                tracker.emoji = emoji;
            }
            if let Some(color) = color {
                tracker.color = color;
            }
            if let Some(schedule) = schedule_of(days, on.as_deref(), style, now)? {
                tracker.schedule = schedule;
            }
            session.update_tracker(tracker.clone()).await?;
            println!("Updated {} {}", tracker.emoji, tracker.name.trim());
        }
        TrackerCommand::Delete { tracker } => {
            let tracker = session.find_tracker(&tracker)?.clone();
            session.delete_tracker(tracker.id).await?;
            println!("Deleted {} {}", tracker.emoji, tracker.name);
        }
        TrackerCommand::Pin { tracker } => {
            let tracker = session.find_tracker(&tracker)?.clone();
            let pinned = session.toggle_pinned(tracker.id).await?;
            let state = if pinned { "Pinned" } else { "Unpinned" };
            println!("{state} {} {}", tracker.emoji, tracker.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use crate::{
        app::session::TrackerSession,
        cli::dates::DateStyle,
        model::{Rgb, Schedule, Weekday},
        services::{
            analytics::MockAnalytics,
            localization::{BundledLocalizer, Locale},
        },
        storage::JsonTrackerStore,
        utils::clock::{Clock, FixedClock},
    };

    use super::{
        parse_color, process_category_command, process_tracker_command, CategoryCommand,
        ScheduleArgs, TrackerCommand,
    };

    const TODAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();

    #[test]
    fn colours_are_strict() {
        assert_eq!(parse_color("#fd4c49"), Ok(Rgb::new(0xFD, 0x4C, 0x49)));
        assert!(parse_color("red").is_err());
    }

    #[tokio::test]
    async fn test_catalog_commands() -> Result<()> {
        let dir = tempdir()?;
        let mut analytics = MockAnalytics::new();
        analytics.expect_report().return_const(());
        let clock = FixedClock::on(TODAY);
        let mut session = TrackerSession::new(
            JsonTrackerStore::new(dir.path().to_owned())?,
            Box::new(analytics),
            Box::new(BundledLocalizer::new(Locale::En)),
            Box::new(clock),
        );
        session.load().await?;

        process_category_command(
            &mut session,
            CategoryCommand::Add {
                name: "Home".into(),
            },
        )
        .await?;
        process_tracker_command(
            &mut session,
            TrackerCommand::Add {
                name: "Party".into(),
                category: "Home".into(),
                emoji: "🎉".into(),
                color: Rgb::WHITE,
                schedule: ScheduleArgs {
                    days: None,
                    on: Some("12/01/2025".into()),
                },
            },
            DateStyle::Uk,
            clock.time(),
        )
        .await?;
        assert_eq!(
            session.find_tracker("Party")?.schedule,
            Schedule::OnDate(NaiveDate::from_ymd_opt(2025, 1, 12).unwrap())
        );

        process_tracker_command(
            &mut session,
            TrackerCommand::Edit {
                tracker: "Party".into(),
                name: Some("Dance".into()),
                category: None,
                emoji: None,
                color: None,
                days: Some([Weekday::Friday].into_iter().collect()),
                on: None,
            },
            DateStyle::Uk,
            clock.time(),
        )
        .await?;
        let tracker = session.find_tracker("Dance")?;
        assert_eq!(
            tracker.schedule,
            Schedule::Weekly([Weekday::Friday].into_iter().collect())
        );

        process_category_command(
            &mut session,
            CategoryCommand::Delete {
                name: "Home".into(),
            },
        )
        .await?;
        assert!(session.categories().is_empty());
        Ok(())
    }
}
