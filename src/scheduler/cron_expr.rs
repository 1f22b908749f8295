//! Five-field cron expressions.
//!
//! Accepts the classic `minute hour day-of-month month day-of-week` form,
//! evaluated in UTC. Day-of-week takes 0-7 (0 and 7 are Sunday) or
//! three-letter names, and is rewritten into the 1-7 (Sunday = 1) form the
//! `cron` crate expects. The other fields pass through unchanged.
//!
//! When both day-of-month and day-of-week are restricted, a day matches if
//! either field matches, as in classic cron. A field starting with `*` or
//! `?` counts as unrestricted.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// A parsed five-field schedule
#[derive(Debug, Clone)]
pub struct CronExpr {
    expression: String,
    schedule: cron::Schedule,
    /// Day-of-week half when both day fields are restricted
    by_weekday: Option<cron::Schedule>,
}

impl CronExpr {
    /// Parse a five-field expression, returning the reason on failure
    pub fn parse(expression: &str) -> Result<Self, String> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let [minute, hour, day_of_month, month, day_of_week] = fields[..] else {
            return Err(format!("expected 5 fields, found {}", fields.len()));
        };
        let both_restricted = is_restricted(day_of_month) && is_restricted(day_of_week);
        let day_of_week = translate_day_of_week(day_of_week)?;

        let (schedule, by_weekday) = if both_restricted {
            let by_month_day = build(minute, hour, day_of_month, month, "*")?;
            let by_weekday = build(minute, hour, "*", month, &day_of_week)?;
            (by_month_day, Some(by_weekday))
        } else {
            (build(minute, hour, day_of_month, month, &day_of_week)?, None)
        };

        Ok(Self {
            expression: fields.join(" "),
            schedule,
            by_weekday,
        })
    }

    /// The expression as written, whitespace-normalized
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First firing strictly after `after`
    pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        let next = self.schedule.after(after).next();
        let Some(by_weekday) = &self.by_weekday else {
            return next;
        };
        match (next, by_weekday.after(after).next()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

fn is_restricted(field: &str) -> bool {
    !(field.starts_with('*') || field.starts_with('?'))
}

fn build(
    minute: &str,
    hour: &str,
    day_of_month: &str,
    month: &str,
    day_of_week: &str,
) -> Result<cron::Schedule, String> {
    let full = format!("0 {minute} {hour} {day_of_month} {month} {day_of_week} *");
    cron::Schedule::from_str(&full).map_err(|e| e.to_string())
}

/// Rewrite a 0-7 day-of-week field as an explicit 1-7 list.
fn translate_day_of_week(field: &str) -> Result<String, String> {
    if field == "*" || field == "?" {
        return Ok(field.to_string());
    }

    let mut days = BTreeSet::new();
    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("invalid day-of-week step '{step}'"))?;
                if step == 0 {
                    return Err("day-of-week step must be positive".to_string());
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (start, end) = if range == "*" {
            (0, 6)
        } else if let Some((a, b)) = range.split_once('-') {
            (parse_day(a)?, parse_day(b)?)
        } else {
            let day = parse_day(range)?;
            // `5/2` means "from Friday, every other day"
            if step > 1 { (day, 6) } else { (day, day) }
        };

        if start > end {
            return Err(format!("day-of-week range '{range}' runs backwards"));
        }

        for day in (start..=end).step_by(step as usize) {
            days.insert(day % 7);
        }
    }

    // cron crate numbering: Sunday = 1 .. Saturday = 7
    Ok(days
        .iter()
        .map(|day| (day + 1).to_string())
        .collect::<Vec<_>>()
        .join(","))
}

fn parse_day(value: &str) -> Result<u32, String> {
    if let Ok(day) = value.parse::<u32>() {
        return if day <= 7 {
            Ok(day)
        } else {
            Err(format!("day-of-week '{value}' out of range 0-7"))
        };
    }

    DAY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(value))
        .map(|index| index as u32)
        .ok_or_else(|| format!("invalid day-of-week '{value}'"))
}
