use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{require_non_blank, CreateTimelineEvent, TimelineEvent};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl DayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DayStatus::Upcoming => "upcoming",
            DayStatus::Ongoing => "ongoing",
            DayStatus::Completed => "completed",
            DayStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for DayStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(DayStatus::Upcoming),
            "ongoing" => Ok(DayStatus::Ongoing),
            "completed" => Ok(DayStatus::Completed),
            "cancelled" => Ok(DayStatus::Cancelled),
            other => Err(AppError::Validation(format!("Invalid day status: {}", other))),
        }
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// Tour Day Models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDay {
    pub id: String,
    pub day: i64,
    /// Human-readable label, e.g. "Mon, 14 Apr".
    pub date: String,
    pub date_obj: NaiveDate,
    pub title: String,
    pub location: String,
    pub status: DayStatus,
    pub events: Vec<TimelineEvent>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTourDay {
    pub day: i64,
    pub date: String,
    pub date_obj: NaiveDate,
    pub title: String,
    pub location: String,
    #[serde(default)]
    pub status: DayStatus,
    #[serde(default)]
    pub events: Vec<CreateTimelineEvent>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial header update. Events are changed through their own operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTourDay {
    pub day: Option<i64>,
    pub date: Option<String>,
    pub date_obj: Option<NaiveDate>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub status: Option<DayStatus>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

fn validate_day_number(day: i64) -> AppResult<()> {
    if day <= 0 {
        return Err(AppError::Validation(format!(
            "day must be a positive integer, got {}",
            day
        )));
    }
    Ok(())
}

impl CreateTourDay {
    pub fn new(day: i64, date: &str, date_obj: NaiveDate, title: &str, location: &str) -> Self {
        Self {
            day,
            date: date.to_string(),
            date_obj,
            title: title.to_string(),
            location: location.to_string(),
            status: DayStatus::default(),
            events: Vec::new(),
            is_active: true,
        }
    }

    pub fn with_event(mut self, event: CreateTimelineEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        validate_day_number(self.day)?;
        require_non_blank(&self.date, "date")?;
        require_non_blank(&self.title, "title")?;
        require_non_blank(&self.location, "location")?;
        for event in &self.events {
            event.validate()?;
        }
        Ok(())
    }
}

impl UpdateTourDay {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(day) = self.day {
            validate_day_number(day)?;
        }
        if let Some(date) = &self.date {
            require_non_blank(date, "date")?;
        }
        if let Some(title) = &self.title {
            require_non_blank(title, "title")?;
        }
        if let Some(location) = &self.location {
            require_non_blank(location, "location")?;
        }
        Ok(())
    }
}

/// Validate a whole batch and reject repeated day numbers inside it.
pub fn validate_batch(days: &[CreateTourDay]) -> AppResult<()> {
    let mut seen = HashSet::with_capacity(days.len());
    for day in days {
        day.validate()?;
        if !seen.insert(day.day) {
            return Err(AppError::Conflict(format!(
                "day {} appears more than once",
                day.day
            )));
        }
    }
    Ok(())
}
