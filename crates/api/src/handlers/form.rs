//! Handlers for form administration.
//!
//! Reads are served from the definition cache. Every write goes to the
//! database first and then keeps the cache consistent: creates and updates
//! are upserted, deletes and reorders invalidate the site.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use formkit_core::error::CoreError;
use formkit_core::form::{
    sort_for_display, title_label, validate_description, validate_title, validate_window,
    FormDefinition,
};
use formkit_core::ordering::{Direction, MoveOutcome};
use formkit_core::types::DbId;
use formkit_db::models::form::{CreateForm, UpdateForm};
use formkit_db::repositories::{FieldRepo, FormRepo, LogRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub channel_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct TitleParams {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub channel_id: DbId,
    pub content_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct TitleExists {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct MoveResult {
    pub moved: bool,
}

#[derive(Debug, Serialize)]
pub struct FormLabel {
    pub label: String,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Form", id })
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/v1/sites/{site_id}/forms
///
/// With `channel_id`, the channel's forms in display order (unordered forms
/// first). Without it, every form of the site in display order.
pub async fn list_forms(
    State(state): State<AppState>,
    Path(site_id): Path<DbId>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let forms = match params.channel_id {
        Some(channel_id) => state.forms.list_for_channel(site_id, channel_id).await?,
        None => {
            let mut forms = state.forms.get_all(site_id).await?.to_vec();
            sort_for_display(&mut forms);
            forms
        }
    };

    Ok(Json(DataResponse { data: forms }))
}

/// GET /api/v1/sites/{site_id}/forms/unbound
///
/// Forms bound to neither a channel nor a content item, highest taxis
/// first. A site without any gets the default form seeded.
pub async fn list_unbound(
    State(state): State<AppState>,
    Path(site_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut forms = FormRepo::list_unbound(&state.pool, site_id).await?;

    if forms.is_empty() {
        let seeded = FormRepo::create_site_default(&state.pool, site_id).await?;
        state.forms.upsert(seeded.clone().into()).await?;
        forms.push(seeded);
    }

    Ok(Json(DataResponse { data: forms }))
}

/// GET /api/v1/sites/{site_id}/forms/title-exists?title=
pub async fn title_exists(
    State(state): State<AppState>,
    Path(site_id): Path<DbId>,
    Query(params): Query<TitleParams>,
) -> AppResult<impl IntoResponse> {
    let exists = FormRepo::title_exists(&state.pool, site_id, &params.title).await?;

    Ok(Json(DataResponse {
        data: TitleExists { exists },
    }))
}

/// GET /api/v1/sites/{site_id}/forms/resolve?channel_id=&content_id=
///
/// The form bound to a content item, created on first access.
pub async fn resolve_form(
    State(state): State<AppState>,
    Path(site_id): Path<DbId>,
    Query(params): Query<ResolveParams>,
) -> AppResult<impl IntoResponse> {
    if params.channel_id <= 0 || params.content_id <= 0 {
        return Err(AppError::BadRequest(
            "channel_id and content_id must be positive".to_string(),
        ));
    }

    let form = state
        .forms
        .get_or_create(site_id, params.channel_id, params.content_id)
        .await?;

    Ok(Json(DataResponse { data: form }))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/sites/{site_id}/forms/{id}
pub async fn get_form(
    State(state): State<AppState>,
    Path((site_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let form = state.forms.find(site_id, id).await?.ok_or_else(|| not_found(id))?;

    Ok(Json(DataResponse { data: form }))
}

/// GET /api/v1/sites/{site_id}/forms/{id}/fields
///
/// The form's fields in display order.
pub async fn list_fields(
    State(state): State<AppState>,
    Path((site_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    if state.forms.find(site_id, id).await?.is_none() {
        return Err(not_found(id));
    }
    let fields = FieldRepo::list_by_form(&state.pool, id).await?;

    Ok(Json(DataResponse { data: fields }))
}

/// POST /api/v1/sites/{site_id}/forms
///
/// Titles must be unique within the site. The check and the insert are not
/// atomic; two concurrent creates with one title can both succeed.
pub async fn create_form(
    State(state): State<AppState>,
    Path(site_id): Path<DbId>,
    Json(input): Json<CreateForm>,
) -> AppResult<impl IntoResponse> {
    let input = input.into_new_form(site_id, chrono::Utc::now());
    validate_title(&input.title)?;
    validate_description(&input.description)?;
    validate_window(input.time_to_start, input.time_to_end)?;

    if FormRepo::title_exists(&state.pool, site_id, &input.title).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "A form titled '{}' already exists",
            input.title
        ))));
    }

    let form: FormDefinition = FormRepo::create(&state.pool, &input).await?.into();
    state.forms.upsert(form.clone()).await?;

    tracing::info!(site_id, form_id = form.id, taxis = form.taxis, "Form created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: form })))
}

/// PUT /api/v1/sites/{site_id}/forms/{id}
pub async fn update_form(
    State(state): State<AppState>,
    Path((site_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateForm>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        validate_title(title)?;
        let holder = FormRepo::id_by_title(&state.pool, site_id, title).await?;
        if holder.is_some_and(|holder| holder != id) {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "A form titled '{title}' already exists"
            ))));
        }
    }
    if let Some(description) = &input.description {
        validate_description(description)?;
    }

    let current = FormRepo::find_by_id(&state.pool, site_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    validate_window(
        input.time_to_start.unwrap_or(current.time_to_start),
        input.time_to_end.unwrap_or(current.time_to_end),
    )?;

    let form: FormDefinition = FormRepo::update(&state.pool, site_id, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?
        .into();
    state.forms.upsert(form.clone()).await?;

    tracing::info!(site_id, form_id = id, "Form updated");

    Ok(Json(DataResponse { data: form }))
}

/// DELETE /api/v1/sites/{site_id}/forms/{id}
///
/// Removes the form together with its fields and submissions.
pub async fn delete_form(
    State(state): State<AppState>,
    Path((site_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    if !FormRepo::delete(&state.pool, site_id, id).await? {
        return Err(not_found(id));
    }
    state.forms.invalidate(site_id).await;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// POST /api/v1/sites/{site_id}/forms/{id}/move-up
pub async fn move_up(
    state: State<AppState>,
    path: Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    shift(state, path, Direction::Up).await
}

/// POST /api/v1/sites/{site_id}/forms/{id}/move-down
pub async fn move_down(
    state: State<AppState>,
    path: Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    shift(state, path, Direction::Down).await
}

async fn shift(
    State(state): State<AppState>,
    Path((site_id, id)): Path<(DbId, DbId)>,
    direction: Direction,
) -> AppResult<Json<DataResponse<MoveResult>>> {
    let moved = match state.ordering.shift(site_id, id, direction).await? {
        MoveOutcome::UnknownForm => return Err(not_found(id)),
        MoveOutcome::AtEdge => false,
        MoveOutcome::Moved => {
            state.forms.invalidate(site_id).await;
            true
        }
    };

    Ok(Json(DataResponse {
        data: MoveResult { moved },
    }))
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// GET /api/v1/sites/{site_id}/forms/{id}/label
///
/// The administration label with the submission count. A zero count is
/// recomputed from the submission log and persisted once non-zero.
pub async fn get_label(
    State(state): State<AppState>,
    Path((site_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let mut form = state.forms.find(site_id, id).await?.ok_or_else(|| not_found(id))?;

    if form.total_count == 0 {
        let total = LogRepo::count_by_form(&state.pool, id).await?;
        if total > 0 {
            let replied = LogRepo::count_replied(&state.pool, id).await?;
            if let Some(updated) = FormRepo::update_counts(&state.pool, id, total, replied).await? {
                form = updated.into();
                state.forms.upsert(form.clone()).await?;
            }
        }
    }

    Ok(Json(DataResponse {
        data: FormLabel {
            label: title_label(Some(&form)),
        },
    }))
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// DELETE /api/v1/sites/{site_id}/cache
///
/// Drop the site's cached form list, e.g. after out-of-band database edits.
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Path(site_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.forms.invalidate(site_id).await;
    tracing::info!(site_id, "Form cache invalidated on request");

    Ok(StatusCode::NO_CONTENT)
}
