use chrono::NaiveDate;

/// This is the standard way of converting a date to a string in habitrack.
pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Short human label of `date` relative to `today`. Days further away are printed in full.
pub fn relative_day_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "today".into(),
        -1 => "yesterday".into(),
        1 => "tomorrow".into(),
        _ => format!("{} {}", date.format("%a"), format_day(date)),
    }
}
