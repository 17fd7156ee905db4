//! Data types shared by the reconciliation pipeline and the HTTP layer.

pub mod event;

pub use self::event::*;
