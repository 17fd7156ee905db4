//! Extraction of candidate events from a free-text pipeline response.
//!
//! The pipeline answers in markdown and may embed one fenced block tagged
//! `json` holding an array of `{title, date, startTime, endTime}` objects.
//! Everything that goes wrong while reading that block degrades to "no
//! candidates"; the display text is always produced.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{ParsedEvent, ParsedResponse};

pub const DEFAULT_START_TIME: &str = "12:00";
pub const DEFAULT_END_TIME: &str = "13:00";
pub const DEFAULT_TITLE: &str = "Event";

lazy_static::lazy_static! {
    static ref JSON_FENCE: Regex = Regex::new(r"(?is)```json[ \t]*\r?\n?(.*?)```")
        .expect("json fence pattern is valid");
}

/// One entry of the embedded array, before validation. Fields stay loosely
/// typed so only the date/time checks decide whether an entry survives.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandidate {
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    start_time: Option<Value>,
    #[serde(default)]
    end_time: Option<Value>,
}

/// Split a raw response into display text and candidate events.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let Some(captures) = JSON_FENCE.captures(raw) else {
        return ParsedResponse {
            display: raw.trim().to_string(),
            candidates: Vec::new(),
        };
    };

    // Both groups always participate in a match.
    let (Some(block), Some(body)) = (captures.get(0), captures.get(1)) else {
        return ParsedResponse {
            display: raw.trim().to_string(),
            candidates: Vec::new(),
        };
    };

    let mut display = String::with_capacity(raw.len());
    display.push_str(&raw[..block.start()]);
    display.push_str(&raw[block.end()..]);

    ParsedResponse {
        display: display.trim().to_string(),
        candidates: decode_candidates(body.as_str()),
    }
}

fn decode_candidates(body: &str) -> Vec<ParsedEvent> {
    let items: Vec<Value> = match serde_json::from_str(body.trim()) {
        Ok(items) => items,
        Err(e) => {
            debug!("Structured block is not a JSON array, ignoring it: {}", e);
            return Vec::new();
        }
    };

    let total = items.len();
    let candidates: Vec<ParsedEvent> = items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match candidate_from_value(item) {
            Some(event) => Some(event),
            None => {
                debug!("Dropping malformed event at position {}", position);
                None
            }
        })
        .collect();

    debug!("Extracted {} of {} candidate events", candidates.len(), total);
    candidates
}

fn candidate_from_value(item: Value) -> Option<ParsedEvent> {
    // Non-objects fail here and are dropped.
    let raw: RawCandidate = serde_json::from_value(item).ok()?;

    let date = raw.date.as_ref()?.as_str()?;
    let start_time = time_field(raw.start_time.as_ref(), DEFAULT_START_TIME)?;
    let end_time = time_field(raw.end_time.as_ref(), DEFAULT_END_TIME)?;

    let start = local_instant(date, start_time)?;
    let end = local_instant(date, end_time)?;

    Some(ParsedEvent {
        title: title_text(raw.title),
        start,
        end,
    })
}

/// Absent, null or blank falls back to `default`; any other non-string is
/// an unparseable time.
fn time_field<'a>(value: Option<&'a Value>, default: &'a str) -> Option<&'a str> {
    match value {
        None | Some(Value::Null) => Some(default),
        Some(Value::String(s)) if s.trim().is_empty() => Some(default),
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => None,
    }
}

/// Titles are kept exactly as sent. Numbers and booleans are rendered,
/// blank strings and structured values fall back to the default.
fn title_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => DEFAULT_TITLE.to_string(),
    }
}

/// Combine a `YYYY-MM-DD` date and an `HH:MM` time into a local instant.
///
/// Returns `None` when either part does not parse. Ambiguous times resolve
/// to the earlier instant; a time inside a DST gap is moved forward by the
/// hour the clocks skipped.
pub fn local_instant(date: &str, time: &str) -> Option<DateTime<Local>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .ok()?;
    to_local(date.and_time(time))
}

/// Parse a timestamp supplied by the scheduler widget or a JSON import.
///
/// Accepts RFC 3339 (any offset, converted to local time) and offset-less
/// `YYYY-MM-DDTHH:MM[:SS]` / `YYYY-MM-DD HH:MM[:SS]`, read as local time.
pub fn parse_instant(value: &str) -> Option<DateTime<Local>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .and_then(to_local)
}

fn to_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(Duration::hours(1))?;
        Local.from_local_datetime(&shifted).earliest()
    })
}
