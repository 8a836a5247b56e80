pub mod form;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree. See [`form::router`] for the routes.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(form::router())
}
