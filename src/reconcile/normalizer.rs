use uuid::Uuid;

use crate::models::{CalendarEvent, CandidateIndex, EventDraft, ParsedEvent};
use crate::reconcile::parser::parse_instant;

/// Colors cycled over candidates by their position in the response.
pub const PALETTE: [&str; 7] = [
    "#ff7a18", // orange
    "#157a6e", // teal
    "#f4c85f", // mustard
    "#5865f2", // indigo
    "#e0457b", // rose
    "#3ba55d", // green
    "#8e6cef", // violet
];

pub const DRAFT_DEFAULT_TITLE: &str = "New Event";
pub const DRAFT_DEFAULT_COLOR: &str = "#ff7a18";
/// Calendar category for events that do not name one.
pub const DEFAULT_CALENDAR_ID: &str = "personal";

pub fn color_for(index: CandidateIndex) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

pub fn new_event_id() -> String {
    format!("evt-{}", Uuid::new_v4())
}

/// Turn a committed candidate into a calendar event with a fresh id.
pub fn normalize(candidate: &ParsedEvent, index: CandidateIndex) -> CalendarEvent {
    CalendarEvent {
        id: new_event_id(),
        title: candidate.title.clone(),
        start: candidate.start,
        end: candidate.end,
        color: color_for(index).to_string(),
        calendar_id: DEFAULT_CALENDAR_ID.to_string(),
    }
}

/// Normalize a widget/import draft. Only the draft's own fields are read.
///
/// Returns `None` when either instant is missing or unparseable.
pub fn normalize_draft(draft: EventDraft) -> Option<CalendarEvent> {
    let start = parse_instant(draft.start.as_deref()?)?;
    let end = parse_instant(draft.end.as_deref()?)?;

    Some(CalendarEvent {
        id: draft
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(new_event_id),
        title: draft
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DRAFT_DEFAULT_TITLE.to_string()),
        start,
        end,
        color: draft
            .color
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DRAFT_DEFAULT_COLOR.to_string()),
        calendar_id: draft
            .calendar_id
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn candidate() -> ParsedEvent {
        ParsedEvent {
            title: "Jazz Night".to_string(),
            start: Local.with_ymd_and_hms(2026, 2, 21, 19, 30, 0).unwrap(),
            end: Local.with_ymd_and_hms(2026, 2, 21, 21, 30, 0).unwrap(),
        }
    }

    #[test]
    fn copies_fields_verbatim() {
        let source = candidate();
        for index in 0..20 {
            let event = normalize(&source, index);
            assert_eq!(event.title, source.title);
            assert_eq!(event.start, source.start);
            assert_eq!(event.end, source.end);
        }
    }

    #[test]
    fn color_cycles_through_palette() {
        assert_eq!(color_for(0), PALETTE[0]);
        assert_eq!(color_for(6), PALETTE[6]);
        assert_eq!(color_for(7), PALETTE[0]);
        assert_eq!(color_for(15), PALETTE[1]);
        assert_eq!(normalize(&candidate(), 3).color, normalize(&candidate(), 10).color);
    }

    #[test]
    fn ids_are_fresh() {
        let a = normalize(&candidate(), 0);
        let b = normalize(&candidate(), 0);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("evt-"));
    }

    #[test]
    fn draft_defaults_and_allow_list() {
        let draft: EventDraft = serde_json::from_value(serde_json::json!({
            "start": "2026-02-23T19:00",
            "end": "2026-02-23T21:00",
            "calendarId": "work",
            "onClick": "alert(1)"
        }))
        .unwrap();

        let event = normalize_draft(draft).unwrap();
        assert_eq!(event.title, DRAFT_DEFAULT_TITLE);
        assert_eq!(event.color, DRAFT_DEFAULT_COLOR);
        assert_eq!(event.calendar_id, "work");
        assert!(event.id.starts_with("evt-"));
    }

    #[test]
    fn draft_without_calendar_lands_in_personal() {
        let draft = EventDraft {
            start: Some("2026-02-23T19:00".to_string()),
            end: Some("2026-02-23T21:00".to_string()),
            calendar_id: Some(String::new()),
            ..Default::default()
        };
        let event = normalize_draft(draft).unwrap();
        assert_eq!(event.calendar_id, DEFAULT_CALENDAR_ID);
        assert_eq!(normalize(&candidate(), 0).calendar_id, DEFAULT_CALENDAR_ID);
    }

    #[test]
    fn draft_keeps_supplied_id() {
        let draft = EventDraft {
            id: Some("evt-2".to_string()),
            title: Some("Rooftop Jazz Session".to_string()),
            start: Some("2026-02-23T19:00".to_string()),
            end: Some("2026-02-23T21:00".to_string()),
            color: Some("#157a6e".to_string()),
            calendar_id: None,
        };
        let event = normalize_draft(draft).unwrap();
        assert_eq!(event.id, "evt-2");
        assert_eq!(event.color, "#157a6e");
    }

    #[test]
    fn draft_with_bad_instant_is_rejected() {
        let draft = EventDraft {
            start: Some("soon".to_string()),
            end: Some("2026-02-23T21:00".to_string()),
            ..Default::default()
        };
        assert!(normalize_draft(draft).is_none());
        assert!(normalize_draft(EventDraft::default()).is_none());
    }
}
