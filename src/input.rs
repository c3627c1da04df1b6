//! Parsing of human date, time and duration input.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// A parsed start: a moment, or just a day when no time was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    At(NaiveDateTime),
    Day(NaiveDate),
}

/// Parse things like "tomorrow 3pm", "fri 9:30" or "march 20".
pub fn parse_when(input: &str) -> Result<When> {
    let expanded = expand_abbreviations(input);
    let dt = fuzzydate::parse(&expanded)
        .map_err(|_| anyhow::anyhow!("Could not parse date/time: \"{}\"", input))?;

    if has_time_component(input) {
        Ok(When::At(dt))
    } else {
        Ok(When::Day(dt.date()))
    }
}

/// Like [`parse_when`], but a time of day is required.
pub fn parse_moment(input: &str) -> Result<NaiveDateTime> {
    match parse_when(input)? {
        When::At(dt) => Ok(dt),
        When::Day(_) => anyhow::bail!(
            "\"{}\" has no time of day. Try something like \"{} 3pm\"",
            input,
            input
        ),
    }
}

/// Parse "30m", "1h 30m", "2hours" into whole minutes.
pub fn parse_minutes(input: &str) -> Result<u32> {
    let duration = humantime::parse_duration(input.trim())
        .with_context(|| format!("Could not parse duration: \"{}\"", input))?;
    let minutes = u32::try_from(duration.as_secs() / 60).context("Duration too large")?;
    if minutes == 0 {
        anyhow::bail!("Duration must be at least a minute");
    }
    Ok(minutes)
}

/// Day and month abbreviations fuzzydate does not know.
fn expand_abbreviations(input: &str) -> String {
    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| match word {
            "mon" => "monday",
            "tue" | "tues" => "tuesday",
            "wed" => "wednesday",
            "thu" | "thur" | "thurs" => "thursday",
            "fri" => "friday",
            "sat" => "saturday",
            "sun" => "sunday",
            "jan" => "january",
            "feb" => "february",
            "mar" => "march",
            "apr" => "april",
            "jun" => "june",
            "jul" => "july",
            "aug" => "august",
            "sep" | "sept" => "september",
            "oct" => "october",
            "nov" => "november",
            "dec" => "december",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the input names a time of day: "3pm", "3 pm", "15:00", "noon",
/// "midnight" or "at 3".
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();
    if lower.contains("noon") || lower.contains("midnight") {
        return true;
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    let ends_in_digit = |w: &str| w.ends_with(|c: char| c.is_ascii_digit());
    let starts_with_digit = |w: &str| w.starts_with(|c: char| c.is_ascii_digit());

    words.iter().enumerate().any(|(i, word)| {
        let clock = word
            .split_once(':')
            .is_some_and(|(h, m)| ends_in_digit(h) && starts_with_digit(m));

        let meridiem = ["am", "pm"].iter().any(|suffix| {
            word.strip_suffix(*suffix).is_some_and(|rest| {
                if rest.is_empty() {
                    i > 0 && ends_in_digit(words[i - 1])
                } else {
                    rest.chars().all(|c| c.is_ascii_digit())
                }
            })
        });

        let at_hour = *word == "at" && words.get(i + 1).is_some_and(|next| starts_with_digit(next));

        clock || meridiem || at_hour
    })
}
