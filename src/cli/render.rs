use ansi_term::{Colour, Style};

use crate::{
    app::session::{Statistics, TrackerSession},
    model::{Category, Tracker},
    services::localization::Localizer,
    storage::TrackerStore,
    tracking::visibility::SectionTitle,
    utils::time::relative_day_label,
};

/// The main screen: selected day and filter, then every visible section, or the placeholder when
/// there is nothing to show.
pub fn render_main<S: TrackerStore>(session: &TrackerSession<S>) -> String {
    let localizer = session.localizer();
    let mut out = String::new();

    let mut header = format!(
        "{} · {}",
        relative_day_label(session.date(), session.today()),
        localizer.lookup(session.filter().title_key())
    );
    if !session.search().is_empty() {
        header.push_str(&format!(" · \"{}\"", session.search()));
    }
    out.push_str(&format!("{}\n", Style::new().bold().paint(header)));

    if let Some(empty) = session.empty_state() {
        out.push_str(&format!(
            "  {}\n",
            Style::new()
                .dimmed()
                .paint(localizer.lookup(empty.message_key()))
        ));
        return out;
    }

    for section in session.visible().sections {
        let title = match section.title {
            SectionTitle::Pinned => localizer.lookup("section.pinned"),
            SectionTitle::Category(name) => name.to_string(),
        };
        out.push_str(&format!("{}\n", Style::new().underline().paint(title)));
        for tracker in section.trackers {
            out.push_str(&format!(
                "  {}\n",
                tracker_line(
                    tracker,
                    session.is_done(tracker.id),
                    &session.day_count_label(tracker.id)
                )
            ));
        }
    }
    out
}

fn tracker_line(tracker: &Tracker, done: bool, day_count: &str) -> String {
    let swatch = Colour::RGB(tracker.color.r, tracker.color.g, tracker.color.b).paint("●");
    let mark = if done { "[x]" } else { "[ ]" };
    format!(
        "{mark} {swatch} {} {}  {}  {}",
        tracker.emoji,
        tracker.name,
        Style::new().dimmed().paint(day_count),
        Style::new().dimmed().paint(tracker.short_id()),
    )
}

/// Every category with each of its trackers and their schedules.
pub fn render_categories(categories: &[Category], localizer: &dyn Localizer) -> String {
    if categories.is_empty() {
        return format!("{}\n", localizer.lookup("placeholder.no_trackers"));
    }
    let mut out = String::new();
    for category in categories {
        out.push_str(&format!("{}\n", Style::new().bold().paint(&category.name)));
        for tracker in &category.trackers {
            let pin = if tracker.is_pinned { " 📌" } else { "" };
            out.push_str(&format!(
                "  {} {} {}{pin}  {}  {}\n",
                Colour::RGB(tracker.color.r, tracker.color.g, tracker.color.b).paint("●"),
                tracker.emoji,
                tracker.name,
                tracker.schedule,
                Style::new().dimmed().paint(tracker.short_id()),
            ));
        }
    }
    out
}

pub fn render_statistics(statistics: &Statistics, localizer: &dyn Localizer) -> String {
    if statistics.is_empty() {
        return format!("{}\n", localizer.lookup("statistics.empty"));
    }
    let mut out = String::new();
    out.push_str(&format!(
        "{:>6}  {}\n",
        statistics.completed,
        localizer.lookup("statistics.completed")
    ));
    out.push_str(&format!(
        "{:>6}  {}\n",
        statistics.active_days,
        localizer.lookup("statistics.active_days")
    ));
    if let Some(progress) = statistics.progress {
        out.push_str(&format!(
            "{:>6}  {}\n",
            progress.to_string(),
            localizer.lookup("statistics.progress")
        ));
    }
    out
}
