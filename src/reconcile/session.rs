use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{CalendarEvent, CandidateIndex, ParsedEvent, ParsedResponse};
use crate::reconcile::normalizer::normalize;
use crate::reconcile::parser::parse_response;
use crate::reconcile::store::CalendarStore;
use crate::reconcile::tracker::AcceptanceTracker;
use crate::services::pipeline::{result_text, Pipeline};

/// Where one "query → review → commit" cycle currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChatPhase {
    #[default]
    Idle,
    Loading,
    Displayed(ParsedResponse),
    Error(String),
}

/// Proof that a query was started; hand it back to [`ChatSession::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    id: u64,
    input: String,
}

impl QueryTicket {
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// State of one chat widget: the current response, which of its candidates
/// were committed, and the calendar they were committed to.
///
/// This is the handle callers hold instead of reaching for shared global
/// calendar state.
#[derive(Debug, Default)]
pub struct ChatSession {
    phase: ChatPhase,
    tracker: AcceptanceTracker,
    calendar: CalendarStore,
    last_query: u64,
}

impl ChatSession {
    pub fn new(calendar: CalendarStore) -> Self {
        Self {
            phase: ChatPhase::Idle,
            tracker: AcceptanceTracker::new(),
            calendar,
            last_query: 0,
        }
    }

    pub fn phase(&self) -> &ChatPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == ChatPhase::Loading
    }

    pub fn tracker(&self) -> &AcceptanceTracker {
        &self.tracker
    }

    pub fn calendar(&self) -> &CalendarStore {
        &self.calendar
    }

    pub fn calendar_mut(&mut self) -> &mut CalendarStore {
        &mut self.calendar
    }

    /// Candidates of the displayed response, empty in any other phase.
    pub fn candidates(&self) -> &[ParsedEvent] {
        match &self.phase {
            ChatPhase::Displayed(parsed) => &parsed.candidates,
            _ => &[],
        }
    }

    /// Start a query. Blank input and calls made while another query is in
    /// flight are ignored.
    pub fn begin_query(&mut self, input: &str) -> Option<QueryTicket> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if self.is_loading() {
            debug!("Query already in flight; ignoring new submission");
            return None;
        }

        self.tracker.reset();
        self.last_query += 1;
        self.phase = ChatPhase::Loading;

        Some(QueryTicket {
            id: self.last_query,
            input: input.to_string(),
        })
    }

    /// Finish the query identified by `ticket` with the pipeline outcome.
    pub fn complete(&mut self, ticket: QueryTicket, outcome: AppResult<serde_json::Value>) {
        if !self.is_loading() || ticket.id != self.last_query {
            warn!("Ignoring completion for stale query {}", ticket.id);
            return;
        }

        self.phase = match outcome {
            Ok(payload) => {
                let parsed = parse_response(&result_text(&payload));
                info!(
                    "Query {} returned {} candidate events",
                    ticket.id,
                    parsed.candidates.len()
                );
                ChatPhase::Displayed(parsed)
            }
            Err(e) => {
                warn!("Query {} failed: {}", ticket.id, e);
                ChatPhase::Error(e.to_string())
            }
        };
    }

    /// Run a full query against `pipeline`. Returns `false` when the
    /// submission was ignored.
    pub async fn submit(&mut self, pipeline: &dyn Pipeline, input: &str) -> bool {
        let Some(ticket) = self.begin_query(input) else {
            return false;
        };
        let outcome = pipeline.execute(ticket.input()).await;
        self.complete(ticket, outcome);
        true
    }

    fn displayed(&self) -> AppResult<&ParsedResponse> {
        match &self.phase {
            ChatPhase::Displayed(parsed) => Ok(parsed),
            _ => Err(AppError::BadRequest(
                "No response with candidates is displayed".to_string(),
            )),
        }
    }

    /// Commit one candidate. Returns `None` if it was already committed.
    pub fn add_single(&mut self, index: CandidateIndex) -> AppResult<Option<CalendarEvent>> {
        let candidate = self
            .displayed()?
            .candidates
            .get(index)
            .ok_or_else(|| AppError::NotFound(format!("candidate {}", index)))?;

        if self.tracker.is_accepted(index) {
            return Ok(None);
        }

        let event = normalize(candidate, index);
        self.calendar.focus(event.start);
        self.calendar.append([event.clone()]);
        self.tracker.mark_accepted(index);

        Ok(Some(event))
    }

    /// Commit every candidate not committed yet, in one step.
    pub fn add_all(&mut self) -> AppResult<Vec<CalendarEvent>> {
        let parsed = self.displayed()?;
        let Some(first) = parsed.candidates.first() else {
            return Ok(Vec::new());
        };
        let focus = first.start;
        let total = parsed.candidates.len();

        let events: Vec<CalendarEvent> = self
            .tracker
            .pending(total)
            .into_iter()
            .map(|index| normalize(&parsed.candidates[index], index))
            .collect();

        self.calendar.append(events.iter().cloned());
        self.tracker.mark_all(total);
        self.calendar.focus(focus);

        info!("Committed {} candidate events", events.len());
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use serde_json::json;
    use std::sync::Mutex;

    fn response(events: &[(&str, &str, &str)]) -> serde_json::Value {
        let items: Vec<serde_json::Value> = events
            .iter()
            .map(|(title, date, start)| {
                json!({ "title": title, "date": date, "startTime": start, "endTime": "23:00" })
            })
            .collect();
        json!({
            "result": format!("Here you go\n```json\n{}\n```", serde_json::Value::Array(items))
        })
    }

    fn displayed_session(payload: serde_json::Value) -> ChatSession {
        let mut session = ChatSession::new(CalendarStore::new(
            Local.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap(),
        ));
        let ticket = session.begin_query("events").unwrap();
        session.complete(ticket, Ok(payload));
        session
    }

    struct ScriptedPipeline {
        replies: Mutex<Vec<AppResult<serde_json::Value>>>,
    }

    #[async_trait]
    impl Pipeline for ScriptedPipeline {
        async fn execute(&self, _user_input: &str) -> AppResult<serde_json::Value> {
            self.replies.lock().unwrap().remove(0)
        }
    }

    #[test]
    fn submission_while_loading_is_ignored() {
        let mut session = ChatSession::default();
        assert!(session.begin_query("   ").is_none());

        let ticket = session.begin_query("jazz").unwrap();
        assert_eq!(ticket.input(), "jazz");
        assert!(session.begin_query("again").is_none());

        session.complete(ticket, Ok(json!({ "result": "nothing" })));
        assert_eq!(
            session.phase(),
            &ChatPhase::Displayed(ParsedResponse {
                display: "nothing".to_string(),
                candidates: vec![],
            })
        );
        assert!(session.begin_query("again").is_some());
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut session = ChatSession::default();
        let ticket = session.begin_query("one").unwrap();
        session.complete(ticket.clone(), Ok(json!({ "result": "first" })));
        session.complete(ticket, Ok(json!({ "result": "second" })));

        match session.phase() {
            ChatPhase::Displayed(parsed) => assert_eq!(parsed.display, "first"),
            other => panic!("unexpected phase {:?}", other),
        }
    }

    #[test]
    fn failure_enters_error_without_candidates() {
        let mut session = ChatSession::default();
        let ticket = session.begin_query("jazz").unwrap();
        session.complete(
            ticket,
            Err(AppError::Upstream {
                status: 500,
                body: "boom".to_string(),
            }),
        );

        assert_eq!(
            session.phase(),
            &ChatPhase::Error("Pipeline request failed (500): boom".to_string())
        );
        assert!(session.candidates().is_empty());
        assert!(matches!(session.add_all(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn add_single_focuses_and_dedupes() {
        let mut session = displayed_session(response(&[
            ("A", "2026-02-10", "18:00"),
            ("B", "2026-02-12", "19:00"),
        ]));

        let event = session.add_single(1).unwrap().unwrap();
        assert_eq!(event.title, "B");
        assert_eq!(event.color, crate::reconcile::normalizer::color_for(1));
        assert_eq!(session.calendar().focused_date(), event.start);

        assert!(session.add_single(1).unwrap().is_none());
        assert_eq!(session.calendar().len(), 1);
        assert!(matches!(session.add_single(5), Err(AppError::NotFound(_))));
    }

    #[test]
    fn add_all_commits_remaining_and_focuses_first() {
        let mut session = displayed_session(response(&[
            ("A", "2026-02-10", "18:00"),
            ("B", "2026-02-12", "19:00"),
            ("C", "2026-02-14", "20:00"),
        ]));
        session.add_single(2).unwrap();
        let before = session.tracker().len();

        let added = session.add_all().unwrap();
        assert_eq!(added.len(), 3 - before);
        assert!(session.tracker().all_accepted(3));
        assert_eq!(session.calendar().len(), 3);
        assert_eq!(
            session.calendar().focused_date(),
            Local.with_ymd_and_hms(2026, 2, 10, 18, 0, 0).unwrap()
        );

        assert!(session.add_all().unwrap().is_empty());
        assert_eq!(session.calendar().len(), 3);
    }

    #[test]
    fn add_all_with_no_candidates_is_noop() {
        let mut session = displayed_session(json!({ "result": "no events this week" }));
        let focus = session.calendar().focused_date();

        assert!(session.add_all().unwrap().is_empty());
        assert!(session.tracker().is_empty());
        assert_eq!(session.calendar().focused_date(), focus);
    }

    #[tokio::test]
    async fn acceptance_does_not_leak_between_queries() {
        let pipeline = ScriptedPipeline {
            replies: Mutex::new(vec![
                Ok(response(&[
                    ("A", "2026-02-10", "18:00"),
                    ("B", "2026-02-11", "18:00"),
                    ("C", "2026-02-12", "18:00"),
                ])),
                Ok(response(&[("D", "2026-03-01", "10:00")])),
            ]),
        };
        let mut session = ChatSession::default();

        assert!(session.submit(&pipeline, "first").await);
        session.add_all().unwrap();
        assert_eq!(session.tracker().len(), 3);

        assert!(session.submit(&pipeline, "second").await);
        assert!(session.tracker().is_empty());
        assert!(!session.tracker().all_accepted(1));

        let event = session.add_single(0).unwrap().unwrap();
        assert_eq!(event.title, "D");
        assert_eq!(session.calendar().len(), 4);
    }
}
