use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use std::fmt;
use time::{Date, OffsetDateTime};

/// Length of one bookable interval in minutes.
pub const SLOT_STEP_MINUTES: i32 = 15;

/// One of the 96 quarter-hour labels ("00:00" .. "23:45").
///
/// Stored as TEXT; the zero-padded format sorts chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct TimeLabel(String);

impl TimeLabel {
    pub fn parse(value: &str) -> Result<Self, TimeLabelError> {
        let (hh, mm) = value
            .split_once(':')
            .ok_or_else(|| TimeLabelError(value.to_string()))?;
        if hh.len() != 2 || mm.len() != 2 {
            return Err(TimeLabelError(value.to_string()));
        }
        let hours: i32 = hh.parse().map_err(|_| TimeLabelError(value.to_string()))?;
        let minutes: i32 = mm.parse().map_err(|_| TimeLabelError(value.to_string()))?;
        if hours >= 24 || minutes >= 60 || minutes % SLOT_STEP_MINUTES != 0 {
            return Err(TimeLabelError(value.to_string()));
        }
        Ok(TimeLabel(value.to_string()))
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> i32 {
        // Only constructed through `parse`, so the split cannot fail.
        let (hh, mm) = self.0.split_once(':').unwrap_or(("0", "0"));
        hh.parse::<i32>().unwrap_or(0) * 60 + mm.parse::<i32>().unwrap_or(0)
    }

    pub fn from_minutes(minutes: i32) -> Option<Self> {
        if !(0..24 * 60).contains(&minutes) || minutes % SLOT_STEP_MINUTES != 0 {
            return None;
        }
        Some(TimeLabel(format!("{:02}:{:02}", minutes / 60, minutes % 60)))
    }

    /// The full quarter-hour grid for one day.
    pub fn grid() -> impl Iterator<Item = TimeLabel> {
        (0..24 * 60)
            .step_by(SLOT_STEP_MINUTES as usize)
            .map(|m| TimeLabel::from_minutes(m).unwrap_or_else(|| TimeLabel("00:00".into())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TimeLabel {
    type Error = TimeLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeLabel::parse(&value)
    }
}

impl From<TimeLabel> for String {
    fn from(label: TimeLabel) -> Self {
        label.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a quarter-hour time label: {0}")]
pub struct TimeLabelError(String);

/// Persisted slot plus its live-consumption flag, joined from
/// `booking_slots`. A slot is immutable once created; availability
/// changes are always create-or-delete, never update.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SlotRecord {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub date: Date,
    pub time_label: TimeLabel,
    pub created_at: OffsetDateTime,
    /// Held by a non-terminal booking.
    pub booked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quarter_hour_labels() {
        assert!(TimeLabel::parse("00:00").is_ok());
        assert!(TimeLabel::parse("09:15").is_ok());
        assert!(TimeLabel::parse("23:45").is_ok());
    }

    #[test]
    fn rejects_off_grid_labels() {
        assert!(TimeLabel::parse("09:10").is_err());
        assert!(TimeLabel::parse("24:00").is_err());
        assert!(TimeLabel::parse("9:15").is_err());
        assert!(TimeLabel::parse("0915").is_err());
    }

    #[test]
    fn minutes_round_trip() {
        let label = TimeLabel::parse("13:45").unwrap();
        assert_eq!(label.minutes(), 13 * 60 + 45);
        assert_eq!(TimeLabel::from_minutes(label.minutes()), Some(label));
    }

    #[test]
    fn grid_has_96_entries() {
        let grid: Vec<_> = TimeLabel::grid().collect();
        assert_eq!(grid.len(), 96);
        assert_eq!(grid.first().unwrap().as_str(), "00:00");
        assert_eq!(grid.last().unwrap().as_str(), "23:45");
    }
}
