pub mod health;
pub mod medication;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(medication::router())
        .merge(notification::router())
        .with_state(state)
}
