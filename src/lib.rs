//! Event Findr backend.
//!
//! A thin proxy in front of the hosted event-discovery pipeline, plus the
//! reconciliation logic that turns its markdown answers into calendar events.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod reconcile;
pub mod routes;
pub mod services;

use config::Config;
use services::pipeline::PipelineClient;

pub struct AppState {
    pub config: Config,
    pub pipeline: PipelineClient,
}
