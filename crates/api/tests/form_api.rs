//! HTTP-level integration tests for the form endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener. Routers are cloned where a test relies
//! on the definition cache surviving between requests.

mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, delete, get, post, post_json, put_json};
use formkit_db::models::log::CreateFormLog;
use formkit_db::repositories::{FormRepo, LogRepo};
use sqlx::PgPool;

async fn create(app: axum::Router, site_id: i64, body: serde_json::Value) -> serde_json::Value {
    let response = post_json(app, &format!("/api/v1/sites/{site_id}/forms"), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

fn ids(json: &serde_json::Value) -> Vec<i64> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_i64().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_form_returns_201(pool: PgPool) {
    let app = common::build_test_app(pool);
    let form = create(app, 1, serde_json::json!({"title": "Contact"})).await;

    assert_eq!(form["title"], "Contact");
    assert_eq!(form["site_id"], 1);
    assert_eq!(form["taxis"], 1);
    assert!(form["id"].is_number());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_duplicate_title_returns_409(pool: PgPool) {
    let app = common::build_test_app(pool);
    create(app.clone(), 1, serde_json::json!({"title": "Contact"})).await;

    let response = post_json(
        app.clone(),
        "/api/v1/sites/1/forms",
        serde_json::json!({"title": "Contact"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");

    // Titles are scoped per site.
    create(app, 2, serde_json::json!({"title": "Contact"})).await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_second_form_for_content_returns_409(pool: PgPool) {
    let app = common::build_test_app(pool);
    create(
        app.clone(),
        1,
        serde_json::json!({"title": "First", "channel_id": 2, "content_id": 3}),
    )
    .await;

    let response = post_json(
        app,
        "/api/v1/sites/1/forms",
        serde_json::json!({"title": "Second", "channel_id": 2, "content_id": 3}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "A form is already bound to this content item");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_invalid_title_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app.clone(),
        "/api/v1/sites/1/forms",
        serde_json::json!({"title": "   "}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = post_json(
        app,
        "/api/v1/sites/1/forms",
        serde_json::json!({"title": "x".repeat(201)}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_get_form_and_missing_form(pool: PgPool) {
    let app = common::build_test_app(pool);
    let form = create(app.clone(), 1, serde_json::json!({"title": "Survey"})).await;
    let id = form["id"].as_i64().unwrap();

    let response = get(app.clone(), &format!("/api/v1/sites/1/forms/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["title"], "Survey");

    let response = get(app.clone(), &format!("/api/v1/sites/2/forms/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(app, "/api/v1/sites/1/forms/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_title_exists(pool: PgPool) {
    let app = common::build_test_app(pool);
    create(app.clone(), 1, serde_json::json!({"title": "Feedback"})).await;

    let json = body_json(get(app.clone(), "/api/v1/sites/1/forms/title-exists?title=Feedback").await).await;
    assert_eq!(json["data"]["exists"], true);

    let json = body_json(get(app, "/api/v1/sites/1/forms/title-exists?title=Other").await).await;
    assert_eq!(json["data"]["exists"], false);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_channel_listing_puts_unordered_forms_first(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let low = create(app.clone(), 1, serde_json::json!({"title": "Low", "channel_id": 7})).await;
    let high = create(app.clone(), 1, serde_json::json!({"title": "High", "channel_id": 7})).await;
    let bound = create(
        app.clone(),
        1,
        serde_json::json!({"title": "Bound", "channel_id": 7, "content_id": 70}),
    )
    .await;
    create(app.clone(), 1, serde_json::json!({"title": "Elsewhere", "channel_id": 8})).await;
    assert_eq!(bound["taxis"], 0);

    let json = body_json(get(app, "/api/v1/sites/1/forms?channel_id=7").await).await;
    assert_eq!(
        ids(&json),
        vec![
            bound["id"].as_i64().unwrap(),
            high["id"].as_i64().unwrap(),
            low["id"].as_i64().unwrap(),
        ]
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_unbound_listing_seeds_default_form(pool: PgPool) {
    let app = common::build_test_app(pool);

    let json = body_json(get(app.clone(), "/api/v1/sites/5/forms/unbound").await).await;
    let forms = json["data"].as_array().unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["title"], "Default form");

    // Seeding happens once.
    let again = body_json(get(app.clone(), "/api/v1/sites/5/forms/unbound").await).await;
    assert_eq!(ids(&again), ids(&json));

    // The seeded form is visible through the cached listing.
    let all = body_json(get(app, "/api/v1/sites/5/forms").await).await;
    assert_eq!(ids(&all), ids(&json));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_seeded_form_lists_default_fields(pool: PgPool) {
    let app = common::build_test_app(pool);

    let json = body_json(get(app.clone(), "/api/v1/sites/5/forms/unbound").await).await;
    let id = json["data"][0]["id"].as_i64().unwrap();

    let response = get(app.clone(), &format!("/api/v1/sites/5/forms/{id}/fields")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fields = body_json(response).await;
    let titles: Vec<&str> = fields["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Name", "Mobile", "Age", "City", "Gender", "Message"]);
    assert_eq!(fields["data"][4]["items"], serde_json::json!(["Male", "Female"]));

    // Another site cannot read the form's fields.
    let response = get(app, &format!("/api/v1/sites/6/forms/{id}/fields")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_resolve_creates_once(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let first = body_json(get(app.clone(), "/api/v1/sites/1/forms/resolve?channel_id=3&content_id=9").await).await;
    let second = body_json(get(app.clone(), "/api/v1/sites/1/forms/resolve?channel_id=3&content_id=9").await).await;
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(first["data"]["content_id"], 9);

    assert_eq!(
        FormRepo::id_by_content(&pool, 1, 3, 9).await.unwrap(),
        first["data"]["id"].as_i64()
    );

    let response = get(app, "/api/v1/sites/1/forms/resolve?channel_id=3&content_id=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Update / delete keep the cache consistent
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_is_visible_through_cache(pool: PgPool) {
    let app = common::build_test_app(pool);
    let form = create(app.clone(), 1, serde_json::json!({"title": "Before"})).await;
    let id = form["id"].as_i64().unwrap();

    // Warm the cache.
    get(app.clone(), "/api/v1/sites/1/forms").await;

    let response = put_json(
        app.clone(),
        &format!("/api/v1/sites/1/forms/{id}"),
        serde_json::json!({"title": "After"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["title"], "After");

    let json = body_json(get(app, &format!("/api/v1/sites/1/forms/{id}")).await).await;
    assert_eq!(json["data"]["title"], "After");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_to_taken_title_returns_409(pool: PgPool) {
    let app = common::build_test_app(pool);
    create(app.clone(), 1, serde_json::json!({"title": "Taken"})).await;
    let form = create(app.clone(), 1, serde_json::json!({"title": "Mine"})).await;
    let id = form["id"].as_i64().unwrap();

    let response = put_json(
        app.clone(),
        &format!("/api/v1/sites/1/forms/{id}"),
        serde_json::json!({"title": "Taken"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Keeping the own title is fine.
    let response = put_json(
        app,
        &format!("/api/v1/sites/1/forms/{id}"),
        serde_json::json!({"title": "Mine", "description": "Updated"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_removes_form_from_listing(pool: PgPool) {
    let app = common::build_test_app(pool);
    let keep = create(app.clone(), 1, serde_json::json!({"title": "Keep"})).await;
    let gone = create(app.clone(), 1, serde_json::json!({"title": "Gone"})).await;
    let gone_id = gone["id"].as_i64().unwrap();

    get(app.clone(), "/api/v1/sites/1/forms").await;

    let response = delete(app.clone(), &format!("/api/v1/sites/1/forms/{gone_id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(get(app.clone(), "/api/v1/sites/1/forms").await).await;
    assert_eq!(ids(&json), vec![keep["id"].as_i64().unwrap()]);

    let response = delete(app, &format!("/api/v1/sites/1/forms/{gone_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_cache_invalidation_picks_up_external_writes(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    create(app.clone(), 1, serde_json::json!({"title": "Api"})).await;
    get(app.clone(), "/api/v1/sites/1/forms").await;

    let outside = formkit_core::form::NewForm {
        title: "Outside".to_string(),
        ..formkit_core::form::NewForm::for_content(1, 0, 0, chrono::Utc::now())
    };
    FormRepo::create(&pool, &outside).await.unwrap();

    let json = body_json(get(app.clone(), "/api/v1/sites/1/forms").await).await;
    assert_eq!(ids(&json).len(), 1);

    let response = delete(app.clone(), "/api/v1/sites/1/cache").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(get(app, "/api/v1/sites/1/forms").await).await;
    assert_eq!(ids(&json).len(), 2);
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_move_up_and_down(pool: PgPool) {
    let app = common::build_test_app(pool);
    let a = create(app.clone(), 1, serde_json::json!({"title": "A"})).await;
    let b = create(app.clone(), 1, serde_json::json!({"title": "B"})).await;
    let (a_id, b_id) = (a["id"].as_i64().unwrap(), b["id"].as_i64().unwrap());

    // Highest taxis first.
    let json = body_json(get(app.clone(), "/api/v1/sites/1/forms").await).await;
    assert_eq!(ids(&json), vec![b_id, a_id]);

    let response = post(app.clone(), &format!("/api/v1/sites/1/forms/{a_id}/move-up")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["moved"], true);

    let json = body_json(get(app.clone(), "/api/v1/sites/1/forms").await).await;
    assert_eq!(ids(&json), vec![a_id, b_id]);

    let response = post(app.clone(), &format!("/api/v1/sites/1/forms/{a_id}/move-up")).await;
    assert_eq!(body_json(response).await["data"]["moved"], false);

    let response = post(app.clone(), &format!("/api/v1/sites/1/forms/{a_id}/move-down")).await;
    assert_eq!(body_json(response).await["data"]["moved"], true);

    let response = post(app.clone(), "/api/v1/sites/1/forms/999999/move-down").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A form is unknown outside its own site, even where it would be an edge.
    let response = post(app, &format!("/api/v1/sites/2/forms/{a_id}/move-up")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_label_counts_submissions_lazily(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let form = create(
        app.clone(),
        1,
        serde_json::json!({"title": "Survey", "settings": "{\"isReply\":true}"}),
    )
    .await;
    let id = form["id"].as_i64().unwrap();

    let json = body_json(get(app.clone(), &format!("/api/v1/sites/1/forms/{id}/label")).await).await;
    assert_eq!(json["data"]["label"], "Survey (0)");

    for _ in 0..2 {
        LogRepo::create(&pool, &CreateFormLog { form_id: id, payload: "{}".to_string() })
            .await
            .unwrap();
    }

    let json = body_json(get(app.clone(), &format!("/api/v1/sites/1/forms/{id}/label")).await).await;
    assert_eq!(
        json["data"]["label"],
        r#"<span class="text-danger">Survey (2)</span>"#
    );

    let stored = FormRepo::find_by_id(&pool, 1, id).await.unwrap().unwrap();
    assert_eq!(stored.total_count, 2);

    let json = body_json(get(app, &format!("/api/v1/sites/1/forms/{id}")).await).await;
    assert_eq!(json["data"]["total_count"], 2);
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_render_wires_template_to_container(pool: PgPool) {
    let plugin = tempfile::tempdir().unwrap();
    common::write_template(
        plugin.path(),
        "basic",
        "<html>\n<body class=\"f\">\n<link href=\"../../css/form.css\">\n<input name=\"Name\"/>\n<a id=\"submit\" href=\"#\">Send</a>\n</body>\n</html>",
    );
    let app = common::build_test_app_with_templates(pool, plugin.path());
    let form = create(
        app.clone(),
        1,
        serde_json::json!({"title": "Bound", "channel_id": 2, "content_id": 3}),
    )
    .await;
    let id = form["id"].as_i64().unwrap();

    let response = get(app.clone(), &format!("/api/v1/sites/1/forms/{id}/render?template=basic")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];

    assert_eq!(data["container_id"], "stl_form_1_2_3");
    assert_eq!(data["submit_rewired"], true);
    assert_eq!(data["controls"], serde_json::json!(["<input name=\"Name\"/>"]));
    let html = data["html"].as_str().unwrap();
    assert!(html.starts_with("<div id=\"stl_form_1_2_3\">"));
    assert!(html.contains("{stl.siteUrl}/sitefiles/plugins/form/css/form.css"));
    assert!(html.contains("onclick=\"stlFormSubmit('stl_form_1_2_3')\""));
    assert!(!html.contains("id=\"submit\""));

    let response = get(app.clone(), &format!("/api/v1/sites/1/forms/{id}/render?template=missing")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(app, &format!("/api/v1/sites/1/forms/{id}/render?template=..")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_result_script(pool: PgPool) {
    let app = common::build_test_app(pool);
    let form = create(
        app.clone(),
        4,
        serde_json::json!({"title": "Bound", "channel_id": 5, "content_id": 6}),
    )
    .await;
    let id = form["id"].as_i64().unwrap();

    let response = get(app, &format!("/api/v1/sites/4/forms/{id}/result-script?is_success=true")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "<script>window.parent.postMessage({containerId: 'stl_form_4_5_6', isSuccess: true}, '*');</script>"
    );
}
