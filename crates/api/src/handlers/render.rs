//! Handlers producing embeddable form markup.

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use formkit_core::error::CoreError;
use formkit_core::render::{post_message_script, prepare};
use formkit_core::types::DbId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Template kind used when loading fragments for embedding.
const FORM_TEMPLATE_KIND: &str = "form";

#[derive(Debug, Deserialize)]
pub struct RenderParams {
    /// Template directory under `templates/`.
    pub template: String,
}

#[derive(Debug, Deserialize)]
pub struct ResultParams {
    pub is_success: bool,
}

/// GET /api/v1/sites/{site_id}/forms/{id}/render?template=
///
/// The template's body wired to the form's container, with the controls
/// found in it.
pub async fn render_form(
    State(state): State<AppState>,
    Path((site_id, id)): Path<(DbId, DbId)>,
    Query(params): Query<RenderParams>,
) -> AppResult<impl IntoResponse> {
    let form = state
        .forms
        .find(site_id, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Form", id }))?;

    let fragment = state
        .templates
        .load_fragment(FORM_TEMPLATE_KIND, &params.template)
        .await?;
    let rendered = prepare(&fragment, form.site_id, form.channel_id, form.content_id);

    tracing::debug!(
        site_id,
        form_id = id,
        template = %params.template,
        controls = rendered.controls.len(),
        "Form rendered"
    );

    Ok(Json(DataResponse { data: rendered }))
}

/// GET /api/v1/sites/{site_id}/forms/{id}/result-script?is_success=
///
/// Script posted back to the embedding page after a submission.
pub async fn result_script(
    State(state): State<AppState>,
    Path((site_id, id)): Path<(DbId, DbId)>,
    Query(params): Query<ResultParams>,
) -> AppResult<impl IntoResponse> {
    let form = state
        .forms
        .find(site_id, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Form", id }))?;

    Ok(Html(post_message_script(
        form.site_id,
        form.channel_id,
        form.content_id,
        params.is_success,
    )))
}
