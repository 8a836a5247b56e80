//! Route definitions for site-scoped forms.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{form, render};
use crate::state::AppState;

/// Form routes mounted under `/api/v1`.
///
/// ```text
/// GET    /sites/{site_id}/forms                       -> list_forms (?channel_id)
/// POST   /sites/{site_id}/forms                       -> create_form
/// GET    /sites/{site_id}/forms/unbound               -> list_unbound
/// GET    /sites/{site_id}/forms/title-exists          -> title_exists (?title)
/// GET    /sites/{site_id}/forms/resolve               -> resolve_form (?channel_id, content_id)
/// GET    /sites/{site_id}/forms/{id}                  -> get_form
/// PUT    /sites/{site_id}/forms/{id}                  -> update_form
/// DELETE /sites/{site_id}/forms/{id}                  -> delete_form
/// GET    /sites/{site_id}/forms/{id}/fields           -> list_fields
/// POST   /sites/{site_id}/forms/{id}/move-up          -> move_up
/// POST   /sites/{site_id}/forms/{id}/move-down        -> move_down
/// GET    /sites/{site_id}/forms/{id}/label            -> get_label
/// GET    /sites/{site_id}/forms/{id}/render           -> render_form (?template)
/// GET    /sites/{site_id}/forms/{id}/result-script    -> result_script (?is_success)
/// DELETE /sites/{site_id}/cache                       -> invalidate_cache
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/sites/{site_id}/forms",
            get(form::list_forms).post(form::create_form),
        )
        .route("/sites/{site_id}/forms/unbound", get(form::list_unbound))
        .route("/sites/{site_id}/forms/title-exists", get(form::title_exists))
        .route("/sites/{site_id}/forms/resolve", get(form::resolve_form))
        .route(
            "/sites/{site_id}/forms/{id}",
            get(form::get_form)
                .put(form::update_form)
                .delete(form::delete_form),
        )
        .route("/sites/{site_id}/forms/{id}/fields", get(form::list_fields))
        .route("/sites/{site_id}/forms/{id}/move-up", post(form::move_up))
        .route("/sites/{site_id}/forms/{id}/move-down", post(form::move_down))
        .route("/sites/{site_id}/forms/{id}/label", get(form::get_label))
        .route("/sites/{site_id}/forms/{id}/render", get(render::render_form))
        .route(
            "/sites/{site_id}/forms/{id}/result-script",
            get(render::result_script),
        )
        .route("/sites/{site_id}/cache", delete(form::invalidate_cache))
}
