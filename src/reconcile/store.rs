use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, Months, TimeZone};
use tracing::{debug, info};

use crate::models::{CalendarCategory, CalendarEvent, CalendarView, EventDraft};
use crate::reconcile::normalizer::{new_event_id, normalize_draft, DEFAULT_CALENDAR_ID};

pub const SAMPLE_EVENT_TITLE: &str = "Spontaneous pop-up";
const SAMPLE_EVENT_COLOR: &str = "#157a6e";

/// Accepted events plus the focused date and view, as consumed by the
/// scheduler widget.
#[derive(Debug, Clone)]
pub struct CalendarStore {
    events: HashMap<String, CalendarEvent>,
    calendars: Vec<CalendarCategory>,
    focused_date: DateTime<Local>,
    view: CalendarView,
}

impl Default for CalendarStore {
    fn default() -> Self {
        Self::new(Local::now())
    }
}

impl CalendarStore {
    pub fn new(focused_date: DateTime<Local>) -> Self {
        Self {
            events: HashMap::new(),
            calendars: seed_calendars(),
            focused_date,
            view: CalendarView::default(),
        }
    }

    /// Store pre-filled with the three events shown on the landing page.
    pub fn with_demo_events() -> Self {
        let mut store = Self::default();
        store.append(demo_events());
        store
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Insert events keyed by id and return how many were inserted.
    ///
    /// Title/time duplicates are kept. An event whose id is already present
    /// is skipped and the stored record stays untouched.
    pub fn append(&mut self, events: impl IntoIterator<Item = CalendarEvent>) -> usize {
        let mut inserted = 0;
        for event in events {
            if self.insert_new(event) {
                inserted += 1;
            }
        }
        inserted
    }

    fn insert_new(&mut self, event: CalendarEvent) -> bool {
        if self.events.contains_key(&event.id) {
            debug!("Skipping event with duplicate id {}", event.id);
            return false;
        }
        self.events.insert(event.id.clone(), event);
        true
    }

    /// Replace the event with the same id. Unknown ids are ignored.
    pub fn update(&mut self, event: CalendarEvent) -> bool {
        match self.events.get_mut(&event.id) {
            Some(existing) => {
                *existing = event;
                true
            }
            None => {
                debug!("Ignoring update for unknown event {}", event.id);
                false
            }
        }
    }

    /// Remove the event with the given id. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<CalendarEvent> {
        self.events.remove(id)
    }

    /// Widget create callback: normalize a draft and store it.
    ///
    /// Returns `None` for an unparseable draft or one reusing a stored id.
    pub fn create(&mut self, draft: EventDraft) -> Option<CalendarEvent> {
        let event = normalize_draft(draft)?;
        self.insert_new(event.clone()).then_some(event)
    }

    /// One-hour "Spontaneous pop-up" starting now.
    pub fn add_sample_event(&mut self) -> CalendarEvent {
        let start = Local::now();
        let event = CalendarEvent {
            id: new_event_id(),
            title: SAMPLE_EVENT_TITLE.to_string(),
            start,
            end: start + Duration::hours(1),
            color: SAMPLE_EVENT_COLOR.to_string(),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
        };
        self.events.insert(event.id.clone(), event.clone());
        event
    }

    /// Drop everything and restore the demo events. Calendar toggles are kept.
    pub fn reset_to_demo(&mut self) {
        self.events.clear();
        let restored = self.append(demo_events());
        info!("Calendar reset to {} demo events", restored);
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.get(id)
    }

    pub fn events(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.events.values()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The earliest `limit` events by start.
    pub fn upcoming(&self, limit: usize) -> Vec<&CalendarEvent> {
        let mut sorted: Vec<&CalendarEvent> = self.events.values().collect();
        sorted.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        sorted.truncate(limit);
        sorted
    }

    /// Add the events found in `payload` (an array of drafts or an object
    /// with an `events` array). Returns how many were added.
    pub fn import_json(&mut self, payload: &serde_json::Value) -> usize {
        let added = self.append(drafts_from_json(payload));
        info!("Imported {} calendar events", added);
        added
    }

    /// Like [`import_json`](Self::import_json), but drops every existing
    /// event first.
    pub fn replace_from_json(&mut self, payload: &serde_json::Value) -> usize {
        let incoming = drafts_from_json(payload);
        self.events.clear();
        let added = self.append(incoming);
        info!("Replaced calendar with {} events", added);
        added
    }

    // ------------------------------------------------------------------
    // Calendar categories
    // ------------------------------------------------------------------

    pub fn calendars(&self) -> &[CalendarCategory] {
        &self.calendars
    }

    /// Set a category's `active` flag. Returns `false` for unknown ids.
    pub fn toggle_calendar(&mut self, id: &str, active: bool) -> bool {
        match self.calendars.iter_mut().find(|c| c.id == id) {
            Some(calendar) => {
                calendar.active = active;
                true
            }
            None => {
                debug!("Ignoring toggle for unknown calendar {}", id);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Focus / view
    // ------------------------------------------------------------------

    pub fn focused_date(&self) -> DateTime<Local> {
        self.focused_date
    }

    pub fn focus(&mut self, date: DateTime<Local>) {
        self.focused_date = date;
    }

    pub fn go_to_today(&mut self) {
        self.focused_date = Local::now();
    }

    pub fn view(&self) -> CalendarView {
        self.view
    }

    pub fn set_view(&mut self, view: CalendarView) {
        self.view = view;
    }

    /// Move the focused date one view-sized step forward (`direction > 0`)
    /// or backward.
    pub fn shift(&mut self, direction: i32) {
        let current = self.focused_date;
        let steps = direction.unsigned_abs();
        let next = match self.view {
            CalendarView::Month if direction >= 0 => current.checked_add_months(Months::new(steps)),
            CalendarView::Month => current.checked_sub_months(Months::new(steps)),
            CalendarView::Week => {
                current.checked_add_signed(Duration::days(7 * i64::from(direction)))
            }
            CalendarView::Day => current.checked_add_signed(Duration::days(i64::from(direction))),
        };
        if let Some(next) = next {
            self.focused_date = next;
        }
    }
}

fn drafts_from_json(payload: &serde_json::Value) -> Vec<CalendarEvent> {
    let items: &[serde_json::Value] = match payload {
        serde_json::Value::Array(items) => items.as_slice(),
        serde_json::Value::Object(map) => match map.get("events") {
            Some(serde_json::Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| serde_json::from_value::<EventDraft>(item.clone()).ok())
        .filter_map(normalize_draft)
        .collect()
}

fn seed_calendars() -> Vec<CalendarCategory> {
    [
        ("work", "Work", "#157a6e"),
        ("personal", "Personal", "#ff7a18"),
        ("wellness", "Wellness", "#f4c85f"),
    ]
    .into_iter()
    .map(|(id, label, color)| CalendarCategory {
        id: id.to_string(),
        label: label.to_string(),
        color: color.to_string(),
        active: true,
    })
    .collect()
}

fn demo_event(
    id: &str,
    title: &str,
    day: u32,
    hours: (u32, u32),
    minute: u32,
    (color, calendar_id): (&str, &str),
) -> Option<CalendarEvent> {
    let start = Local.with_ymd_and_hms(2026, 2, day, hours.0, minute, 0).earliest()?;
    let end = Local.with_ymd_and_hms(2026, 2, day, hours.1, minute, 0).earliest()?;
    Some(CalendarEvent {
        id: id.to_string(),
        title: title.to_string(),
        start,
        end,
        color: color.to_string(),
        calendar_id: calendar_id.to_string(),
    })
}

fn demo_events() -> Vec<CalendarEvent> {
    [
        demo_event("evt-1", "Downtown Night Market", 21, (18, 20), 30, ("#ff7a18", "personal")),
        demo_event("evt-2", "Rooftop Jazz Session", 23, (19, 21), 0, ("#157a6e", "work")),
        demo_event("evt-3", "Sunrise Run Club", 24, (7, 8), 0, ("#f4c85f", "wellness")),
    ]
    .into_iter()
    .flatten()
    .collect()
}
