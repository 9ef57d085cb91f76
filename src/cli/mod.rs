pub mod catalog;
pub mod dates;
pub mod render;
pub mod shell;

use std::path::PathBuf;

use anyhow::Result;
use catalog::{process_category_command, process_tracker_command, CategoryCommand, TrackerCommand};
use clap::{Parser, Subcommand};
use dates::{day_or_today, DateStyle};
use render::{render_main, render_statistics};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    app::{preferences::Preferences, session::TrackerSession},
    model::FilterMode,
    services::{
        analytics::TracingAnalytics,
        localization::{BundledLocalizer, Locale},
    },
    storage::JsonTrackerStore,
    utils::{
        clock::{Clock, DefaultClock},
        dir::application_path,
        logging::{enable_logging, CLI_PREFIX},
        time::format_day,
    },
};

#[derive(Parser, Debug)]
#[command(name = "habitrack", version, long_about = None)]
#[command(about = "Track habits and irregular events from the terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default $XDG_STATE_HOME/habitrack or $HOME/.local/state/habitrack"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Language of the output for this run")]
    locale: Option<Locale>,
    #[arg(
        long,
        global = true,
        default_value_t = DateStyle::Uk,
        help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year"
    )]
    date_style: DateStyle,
}

#[derive(Debug, clap::Args)]
struct DayArgs {
    #[arg(
        long,
        short,
        help = "Day to work with. Examples are \"yesterday\", \"15/03/2025\". Today by default"
    )]
    date: Option<String>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show trackers of a day")]
    List {
        #[command(flatten)]
        day: DayArgs,
        #[arg(long, short, help = "Filter for this run only. The saved one is used otherwise")]
        filter: Option<FilterMode>,
        #[arg(long, short, default_value = "", help = "Only trackers whose name contains the text")]
        search: String,
    },
    #[command(about = "Mark a tracker as done")]
    Done {
        #[arg(help = "Tracker id, id prefix or name")]
        tracker: String,
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(about = "Remove the done mark of a tracker")]
    Undone {
        #[arg(help = "Tracker id, id prefix or name")]
        tracker: String,
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(about = "Manage categories")]
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },
    #[command(about = "Manage trackers")]
    Tracker {
        #[command(subcommand)]
        command: TrackerCommand,
    },
    #[command(about = "Show or save the filter used by list and shell")]
    Filter { mode: Option<FilterMode> },
    #[command(about = "Show or save the language of the output")]
    Language { language: Option<Locale> },
    #[command(about = "Show statistics")]
    Stats {
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(about = "Interactive mode. Type help inside for the list of commands")]
    Shell {
        #[command(flatten)]
        day: DayArgs,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let dir = application_path(args.dir.as_deref())?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;
    info!("Using {dir:?}");

    let mut preferences = Preferences::load(&dir).await;
    let locale = args.locale.unwrap_or(preferences.locale);
    let clock = DefaultClock;
    let now = clock.time();
    let style = args.date_style;

    let mut session = TrackerSession::new(
        JsonTrackerStore::new(dir.clone())?,
        Box::new(TracingAnalytics),
        Box::new(BundledLocalizer::new(locale)),
        Box::new(clock),
    );
    session.restore_filter(preferences.filter);
    session.load().await?;

    match args.commands {
        Commands::List {
            day,
            filter,
            search,
        } => {
            if let Some(filter) = filter {
                session.restore_filter(filter);
            }
            session.select_date(day_or_today(day.date.as_deref(), style, now)?);
            session.set_search(search);
            print!("{}", render_main(&session));
        }
        Commands::Done { tracker, day } => {
            session.select_date(day_or_today(day.date.as_deref(), style, now)?);
            let tracker = session.find_tracker(&tracker)?.clone();
            if session.mark_done(tracker.id).await? {
                println!(
                    "{} {} done on {} ({})",
                    tracker.emoji,
                    tracker.name,
                    format_day(session.date()),
                    session.day_count_label(tracker.id)
                );
            } else {
                println!(
                    "{} was already done on {}",
                    tracker.name,
                    format_day(session.date())
                );
            }
        }
        Commands::Undone { tracker, day } => {
            session.select_date(day_or_today(day.date.as_deref(), style, now)?);
            let tracker = session.find_tracker(&tracker)?.clone();
            if session.mark_undone(tracker.id).await? {
                println!(
                    "{} {} is not done on {} ({})",
                    tracker.emoji,
                    tracker.name,
                    format_day(session.date()),
                    session.day_count_label(tracker.id)
                );
            } else {
                println!(
                    "{} wasn't done on {}",
                    tracker.name,
                    format_day(session.date())
                );
            }
        }
        Commands::Category { command } => process_category_command(&mut session, command).await?,
        Commands::Tracker { command } => {
            process_tracker_command(&mut session, command, style, now).await?
        }
        Commands::Filter { mode: None } => println!("{}", preferences.filter),
        Commands::Filter { mode: Some(mode) } => {
            session.set_filter(mode);
            preferences.filter = mode;
            preferences.save(&dir).await?;
            println!("Filter set to {mode}");
        }
        Commands::Language { language: None } => println!("{}", preferences.locale),
        Commands::Language {
            language: Some(language),
        } => {
            preferences.locale = language;
            preferences.save(&dir).await?;
            println!("Language set to {language}");
        }
        Commands::Stats { day } => {
            session.select_date(day_or_today(day.date.as_deref(), style, now)?);
            print!(
                "{}",
                render_statistics(&session.statistics(), session.localizer())
            );
        }
        Commands::Shell { day } => {
            session.select_date(day_or_today(day.date.as_deref(), style, now)?);
            let session = shell::run_shell(session, style).await?;
            preferences.filter = session.filter();
            preferences.save(&dir).await?;
            return Ok(());
        }
    }

    session.close();
    Ok(())
}
