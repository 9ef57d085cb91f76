use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Parses a day written the way people write them: "today", "yesterday", "15/03/2025".
pub fn parse_day(input: &str, style: DateStyle, now: DateTime<Local>) -> Result<NaiveDate> {
    match parse_date_string(input.trim(), now, style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {input:?}: {e}"),
            )
            .into()),
    }
}

/// The selected day of a command, today when nothing was given.
pub fn day_or_today(
    input: Option<&str>,
    style: DateStyle,
    now: DateTime<Local>,
) -> Result<NaiveDate> {
    match input {
        Some(input) => parse_day(input, style, now),
        None => Ok(now.date_naive()),
    }
}
