//! Reminder scheduling: turns a due date, a set of relative presets and an
//! optional custom time into the concrete timestamps stored for a task.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use chrono::{NaiveDateTime, TimeDelta};

use crate::error::TaskError;
use crate::validate::parse_timestamp;

/// A reminder relative to the task's due timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Preset {
    ThreeDays,
    OneDay,
    TwelveHours,
    OneHour,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::ThreeDays,
        Preset::OneDay,
        Preset::TwelveHours,
        Preset::OneHour,
    ];

    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "3d" => Ok(Self::ThreeDays),
            "1d" => Ok(Self::OneDay),
            "12h" => Ok(Self::TwelveHours),
            "1h" => Ok(Self::OneHour),
            _ => Err(TaskError::invalid(format!(
                "invalid reminder preset '{token}': must be 3d, 1d, 12h, or 1h"
            ))
            .into()),
        }
    }

    /// Parse a list of tokens, failing on the first unknown one.
    pub fn parse_all<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Self>> {
        tokens.iter().map(|t| Self::parse(t.as_ref())).collect()
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::ThreeDays => "3d",
            Self::OneDay => "1d",
            Self::TwelveHours => "12h",
            Self::OneHour => "1h",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ThreeDays => "3 days before",
            Self::OneDay => "1 day before",
            Self::TwelveHours => "12 hours before",
            Self::OneHour => "1 hour before",
        }
    }

    pub fn offset(self) -> TimeDelta {
        match self {
            Self::ThreeDays => TimeDelta::days(3),
            Self::OneDay => TimeDelta::days(1),
            Self::TwelveHours => TimeDelta::hours(12),
            Self::OneHour => TimeDelta::hours(1),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Compute the reminder timestamps for a task.
///
/// Presets only apply when `due` is set. A custom time that does not parse
/// is ignored. Anything not strictly after `now` is dropped. The set is
/// ordered and holds each timestamp once.
pub fn reminder_times(
    due: Option<NaiveDateTime>,
    presets: &[Preset],
    custom: Option<&str>,
    now: NaiveDateTime,
) -> BTreeSet<NaiveDateTime> {
    let mut times = BTreeSet::new();

    if let Some(due) = due {
        for preset in presets {
            let Some(at) = due.checked_sub_signed(preset.offset()) else {
                continue;
            };
            if at > now {
                times.insert(at);
            }
        }
    }

    if let Some(at) = custom.and_then(parse_timestamp) {
        if at > now {
            times.insert(at);
        }
    }

    times
}
