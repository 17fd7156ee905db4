//! Chat-response to calendar reconciliation.
//!
//! raw text → [`parser`] → candidates + display text → user commits one or
//! all → [`normalizer`] assigns id/color → [`tracker`] marks the index →
//! [`store`] receives the event and moves its focus. [`session`] ties the
//! steps to the query lifecycle of one chat widget.

pub mod markdown;
pub mod normalizer;
pub mod parser;
pub mod session;
pub mod store;
pub mod tracker;

pub use self::normalizer::{color_for, normalize, PALETTE};
pub use self::parser::parse_response;
pub use self::session::{ChatPhase, ChatSession, QueryTicket};
pub use self::store::CalendarStore;
pub use self::tracker::AcceptanceTracker;
