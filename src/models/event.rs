use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ============================================================================
// Candidate Models (extracted from one pipeline response)
// ============================================================================

/// Position of a candidate within the response it was parsed from.
pub type CandidateIndex = usize;

/// An event proposed by the pipeline, not yet committed to the calendar.
///
/// `start <= end` is not enforced; the pipeline occasionally emits inverted
/// ranges and they are carried through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedEvent {
    pub title: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

/// Result of parsing one raw pipeline response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedResponse {
    /// Response text with the structured block removed.
    pub display: String,
    /// Candidates in the order the pipeline listed them.
    pub candidates: Vec<ParsedEvent>,
}

// ============================================================================
// Calendar Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub color: String,
    pub calendar_id: String,
}

/// A toggleable calendar category shown in the scheduler sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCategory {
    pub id: String,
    pub label: String,
    pub color: String,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    Day,
    #[default]
    Week,
    Month,
}

/// Loosely-shaped event coming from the scheduler widget or a JSON import.
///
/// Only these fields are read; anything else in the source payload is dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub calendar_id: Option<String>,
}
