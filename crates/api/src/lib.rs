//! HTTP API for medication logs, adherence status and notification settings.

pub mod middleware;
pub mod routes;
pub mod state;
