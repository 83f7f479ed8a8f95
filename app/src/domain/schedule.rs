//! Recurring session generation for batches.
//!
//! A batch meets on a fixed set of weekdays at a fixed local time between
//! two dates. Expanding the rule yields one slot per meeting, which the
//! caller inserts as session rows.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

/// Upper bound on slots generated by one rule.
pub const MAX_SLOTS: usize = 366;

/// Longest session a rule may describe, in hours.
pub const MAX_SESSION_HOURS: i64 = 24;

/// Validation errors raised by [`RecurrenceRule::new`] and
/// [`RecurrenceRule::expand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceValidationError {
    /// No weekday was selected.
    NoWeekdays,
    /// The end date precedes the start date.
    EndsBeforeStart,
    /// Session duration must be positive.
    NonPositiveDuration,
    /// Session duration exceeds [`MAX_SESSION_HOURS`], or a session end
    /// falls outside the representable calendar.
    DurationOutOfRange,
    /// The rule would produce more than [`MAX_SLOTS`] sessions.
    TooManySlots {
        /// The enforced limit.
        max: usize,
    },
}

impl fmt::Display for RecurrenceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWeekdays => write!(f, "select at least one weekday"),
            Self::EndsBeforeStart => write!(f, "end date must not precede start date"),
            Self::NonPositiveDuration => write!(f, "session duration must be positive"),
            Self::DurationOutOfRange => write!(
                f,
                "session duration must not exceed {MAX_SESSION_HOURS} hours"
            ),
            Self::TooManySlots { max } => {
                write!(f, "recurrence would create more than {max} sessions")
            }
        }
    }
}

impl std::error::Error for RecurrenceValidationError {}

/// One generated session occurrence in academy-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSlot {
    /// Start of the session.
    pub starts_at: NaiveDateTime,
    /// End of the session.
    pub ends_at: NaiveDateTime,
}

/// Weekly recurrence for a batch.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, NaiveTime, TimeDelta, Weekday};
/// use wild_robot::domain::RecurrenceRule;
///
/// let rule = RecurrenceRule::new(
///     NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"),
///     NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date"),
///     &[Weekday::Mon, Weekday::Thu],
///     NaiveTime::from_hms_opt(17, 30, 0).expect("valid time"),
///     TimeDelta::minutes(90),
/// )
/// .expect("valid rule");
/// assert_eq!(rule.expand().expect("within limit").len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    starts_on: NaiveDate,
    ends_on: NaiveDate,
    weekdays: [bool; 7],
    start_time: NaiveTime,
    duration: TimeDelta,
}

impl RecurrenceRule {
    /// Validate and build a rule. Duplicate weekdays are ignored.
    pub fn new(
        starts_on: NaiveDate,
        ends_on: NaiveDate,
        weekdays: &[Weekday],
        start_time: NaiveTime,
        duration: TimeDelta,
    ) -> Result<Self, RecurrenceValidationError> {
        if weekdays.is_empty() {
            return Err(RecurrenceValidationError::NoWeekdays);
        }
        if ends_on < starts_on {
            return Err(RecurrenceValidationError::EndsBeforeStart);
        }
        if duration <= TimeDelta::zero() {
            return Err(RecurrenceValidationError::NonPositiveDuration);
        }
        if duration > TimeDelta::hours(MAX_SESSION_HOURS) {
            return Err(RecurrenceValidationError::DurationOutOfRange);
        }

        let mut selected = [false; 7];
        for weekday in weekdays {
            if let Some(flag) = selected.get_mut(weekday.num_days_from_monday() as usize) {
                *flag = true;
            }
        }
        Ok(Self {
            starts_on,
            ends_on,
            weekdays: selected,
            start_time,
            duration,
        })
    }

    fn includes(&self, date: NaiveDate) -> bool {
        self.weekdays
            .get(date.weekday().num_days_from_monday() as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Every slot in the inclusive date range, in chronological order.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceValidationError::TooManySlots`] once the rule
    /// passes [`MAX_SLOTS`] occurrences, and
    /// [`RecurrenceValidationError::DurationOutOfRange`] when a session would
    /// end past the last representable date.
    pub fn expand(&self) -> Result<Vec<SessionSlot>, RecurrenceValidationError> {
        let mut slots = Vec::new();
        for date in self
            .starts_on
            .iter_days()
            .take_while(|date| *date <= self.ends_on)
            .filter(|date| self.includes(*date))
        {
            if slots.len() == MAX_SLOTS {
                return Err(RecurrenceValidationError::TooManySlots { max: MAX_SLOTS });
            }
            let starts_at = date.and_time(self.start_time);
            let ends_at = starts_at
                .checked_add_signed(self.duration)
                .ok_or(RecurrenceValidationError::DurationOutOfRange)?;
            slots.push(SessionSlot { starts_at, ends_at });
        }
        Ok(slots)
    }
}
