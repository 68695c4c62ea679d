use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::require_non_blank;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Departure,
    Arrival,
    Meal,
    Accommodation,
    Sightseeing,
    #[default]
    Activity,
    Industrial,
    Travel,
    Break,
    Shopping,
    Leisure,
    Special,
    Completion,
}

impl EventType {
    pub const ALL: [EventType; 13] = [
        EventType::Departure,
        EventType::Arrival,
        EventType::Meal,
        EventType::Accommodation,
        EventType::Sightseeing,
        EventType::Activity,
        EventType::Industrial,
        EventType::Travel,
        EventType::Break,
        EventType::Shopping,
        EventType::Leisure,
        EventType::Special,
        EventType::Completion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Departure => "departure",
            EventType::Arrival => "arrival",
            EventType::Meal => "meal",
            EventType::Accommodation => "accommodation",
            EventType::Sightseeing => "sightseeing",
            EventType::Activity => "activity",
            EventType::Industrial => "industrial",
            EventType::Travel => "travel",
            EventType::Break => "break",
            EventType::Shopping => "shopping",
            EventType::Leisure => "leisure",
            EventType::Special => "special",
            EventType::Completion => "completion",
        }
    }
}

impl FromStr for EventType {
    type Err = AppError;

    /// Exact match only; unknown tags are rejected rather than mapped to a default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Invalid event type: {}", s)))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
    Delayed,
}

impl EventStatus {
    pub const ALL: [EventStatus; 5] = [
        EventStatus::Upcoming,
        EventStatus::Ongoing,
        EventStatus::Completed,
        EventStatus::Cancelled,
        EventStatus::Delayed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Delayed => "delayed",
        }
    }
}

impl FromStr for EventStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventStatus::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Invalid event status: {}", s)))
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// Timeline Event Models
// ============================================================================

/// One scheduled happening inside a tour day. Owned by its `TourDay`; the
/// position in `TourDay::events` is the chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub time: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub status: EventStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimelineEvent {
    pub time: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[serde(default)]
    pub status: EventStatus,
}

impl CreateTimelineEvent {
    pub fn new(time: &str, title: &str, event_type: EventType) -> Self {
        Self {
            time: time.to_string(),
            title: title.to_string(),
            description: String::new(),
            event_type,
            status: EventStatus::default(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        require_non_blank(&self.time, "event time")?;
        require_non_blank(&self.title, "event title")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_type_is_a_validation_error() {
        let err = "festival".parse::<EventType>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn event_type_parsing_is_exact() {
        assert_eq!("break".parse::<EventType>().unwrap(), EventType::Break);
        assert!("Break".parse::<EventType>().is_err());
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("postponed".parse::<EventStatus>().unwrap_err().is_validation());
        assert_eq!("delayed".parse::<EventStatus>().unwrap(), EventStatus::Delayed);
    }

    #[test]
    fn deserialization_applies_defaults() {
        let ev: CreateTimelineEvent =
            serde_json::from_str(r#"{"time":"08:00","title":"Breakfast"}"#).unwrap();
        assert_eq!(ev.event_type, EventType::Activity);
        assert_eq!(ev.status, EventStatus::Upcoming);
        assert_eq!(ev.description, "");
    }

    #[test]
    fn deserialization_rejects_festival() {
        let res: Result<CreateTimelineEvent, _> =
            serde_json::from_str(r#"{"time":"20:00","title":"Lanterns","type":"festival"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn blank_title_fails_validation() {
        let ev = CreateTimelineEvent::new("09:00", " ", EventType::Travel);
        assert!(ev.validate().unwrap_err().is_validation());
    }
}
