use axum::http::StatusCode;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write a config for a small studio into the temp directory.
fn init_project(dir: &TempDir) {
    let mut config = clientdesk_core::config::Config::new("Northwind Web");
    config.branding.support_email = Some("hello@northwind.test".into());
    clientdesk_core::io::ensure_dir(&dir.path().join(".clientdesk")).unwrap();
    config.save(dir.path()).unwrap();
}

async fn send(app: &axum::Router, req: axum::http::Request<axum::body::Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(
    app: &axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, req).await
}

async fn delete(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

async fn start_session(app: &axum::Router, client_key: Option<&str>) -> (String, serde_json::Value) {
    let body = match client_key {
        Some(key) => serde_json::json!({ "client_key": key }),
        None => serde_json::json!({}),
    };
    let (status, json) = post_json(app, "/api/intake/sessions", body).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    (json["session_id"].as_str().unwrap().to_string(), json)
}

async fn answer(app: &axum::Router, id: &str, value: serde_json::Value) -> serde_json::Value {
    let (status, json) = post_json(
        app,
        &format!("/api/intake/sessions/{id}/answer"),
        serde_json::json!({ "value": value }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    json
}

/// Answer the standard catalog up to the review step.
async fn answer_everything(app: &axum::Router, id: &str) -> serde_json::Value {
    for value in ["Ada Lovelace", "ada@example.com", "", "Analytical Engines", "no", "business"] {
        answer(app, id, serde_json::json!(value)).await;
    }
    answer(app, id, serde_json::json!(["contact-form", "seo"])).await;
    answer(app, id, serde_json::json!("2k-5k")).await;
    answer(app, id, serde_json::json!("asap")).await;
    answer(app, id, serde_json::json!("ready")).await;
    answer(app, id, serde_json::json!("")).await;
    answer(app, id, serde_json::json!("")).await
}

// ---------------------------------------------------------------------------
// Health & config
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_ok() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (status, json) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn config_requires_init() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (status, json) = get(&app, "/api/config").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("not initialized"));

    init_project(&dir);
    let (status, json) = get(&app, "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["branding"]["company_name"], "Northwind Web");
}

// ---------------------------------------------------------------------------
// Intake sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_intake_submits_and_notifies_studio() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let app = clientdesk_server::build_router(dir.path().to_path_buf());

    let (id, first) = start_session(&app, None).await;
    assert_eq!(first["question"]["id"], "greeting");
    assert!(first["question"]["prompt"]
        .as_str()
        .unwrap()
        .contains("Northwind Web"));

    let review = answer_everything(&app, &id).await;
    assert_eq!(review["state"], "review");
    assert!(review["question"].is_null());
    assert_eq!(review["progress"]["percent"], 100);
    assert!(review["summary"].as_array().unwrap().len() >= 3);

    let (status, done) = post_json(
        &app,
        &format!("/api/intake/sessions/{id}/review"),
        serde_json::json!({ "confirm": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{done}");
    assert_eq!(done["state"], "submitted");

    let (_, subs) = get(&app, "/api/submissions").await;
    assert_eq!(subs["total"], 1);
    assert_eq!(subs["items"][0]["client_name"], "Ada Lovelace");
    assert_eq!(
        subs["items"][0]["answers"]["features"],
        serde_json::json!(["contact-form", "seo"])
    );

    let (_, inbox) = get(&app, "/api/notifications?recipient=studio&unread=true").await;
    assert_eq!(inbox["total"], 1);
    assert_eq!(inbox["items"][0]["kind"], "intake");
}

#[tokio::test]
async fn submitted_session_frees_its_client_key() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let app = clientdesk_server::build_router(dir.path().to_path_buf());

    let (id, _) = start_session(&app, Some("ada")).await;
    let (status, _) = post_json(&app, "/api/intake/sessions", serde_json::json!({ "client_key": "ada" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    answer_everything(&app, &id).await;
    let (status, done) = post_json(
        &app,
        &format!("/api/intake/sessions/{id}/review"),
        serde_json::json!({ "confirm": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{done}");
    assert_eq!(done["state"], "submitted");

    let (status, _) = get(&app, &format!("/api/intake/sessions/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Submission cleared the snapshot, so the same client starts fresh.
    let (_, again) = start_session(&app, Some("ada")).await;
    assert_eq!(again["state"], "asking");
    assert_eq!(again["question"]["id"], "greeting");
}

#[tokio::test]
async fn conditional_question_follows_answers() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (id, _) = start_session(&app, None).await;
    for value in ["Ada", "ada@example.com", "", ""] {
        answer(&app, &id, serde_json::json!(value)).await;
    }
    let json = answer(&app, &id, serde_json::json!("yes")).await;
    assert_eq!(json["question"]["id"], "current-url");

    let (status, _) = post_json(
        &app,
        &format!("/api/intake/sessions/{id}/edit"),
        serde_json::json!({ "position": 4 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json = answer(&app, &id, serde_json::json!("no")).await;
    assert_eq!(json["question"]["id"], "project-type");
}

#[tokio::test]
async fn multiselect_toggle_and_confirm() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (id, _) = start_session(&app, None).await;
    for value in ["Ada", "ada@example.com", "", "", "no", "blog"] {
        answer(&app, &id, serde_json::json!(value)).await;
    }

    for value in ["seo", "newsletter", "seo"] {
        let (status, _) = post_json(
            &app,
            &format!("/api/intake/sessions/{id}/toggle"),
            serde_json::json!({ "value": value }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, json) = post_json(
        &app,
        &format!("/api/intake/sessions/{id}/confirm-selection"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["question"]["id"], "budget");
}

#[tokio::test]
async fn saved_progress_resumes_in_new_session() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());

    let (id, _) = start_session(&app, Some("ada-portal")).await;
    answer(&app, &id, serde_json::json!("Ada")).await;
    answer(&app, &id, serde_json::json!("ada@example.com")).await;
    let (status, _) = delete(&app, &format!("/api/intake/sessions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dir.path().join(".clientdesk/intake/ada-portal.json").exists());

    let (id, json) = start_session(&app, Some("ada-portal")).await;
    assert_eq!(json["state"], "resume_prompt");
    let (status, json) = post_json(
        &app,
        &format!("/api/intake/sessions/{id}/resume"),
        serde_json::json!({ "resume": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["question"]["id"], "phone");
}

#[tokio::test]
async fn declined_review_offers_restart() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (id, _) = start_session(&app, None).await;
    answer_everything(&app, &id).await;

    let (_, json) = post_json(
        &app,
        &format!("/api/intake/sessions/{id}/review"),
        serde_json::json!({ "confirm": false }),
    )
    .await;
    assert_eq!(json["state"], "review_declined");

    let (status, json) = post_json(
        &app,
        &format!("/api/intake/sessions/{id}/review/choice"),
        serde_json::json!({ "choice": "restart" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "asking");
    assert_eq!(json["question"]["id"], "greeting");
}

#[tokio::test]
async fn edit_beyond_cursor_is_400() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (id, _) = start_session(&app, None).await;
    let (status, json) = post_json(
        &app,
        &format!("/api/intake/sessions/{id}/edit"),
        serde_json::json!({ "position": 8 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

// ---------------------------------------------------------------------------
// Proposals & notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quote_matches_worked_example() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (status, json) = post_json(
        &app,
        "/api/proposals/quote",
        serde_json::json!({
            "project_type": "business",
            "tier": "better",
            "addons": ["booking"],
            "tax_rate": 0.08
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["display_total"], 2324);
    assert_eq!(json["subtotal"], 2300.0);
}

#[tokio::test]
async fn quote_rejects_unknown_addon() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (status, json) = post_json(
        &app,
        "/api/proposals/quote",
        serde_json::json!({ "project_type": "blog", "tier": "good", "addons": ["teleporter"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("teleporter"));
}

#[tokio::test]
async fn tiers_endpoint_lists_three() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (status, json) = get(&app, "/api/proposals/tiers/ecommerce").await;
    assert_eq!(status, StatusCode::OK);
    let levels: Vec<&str> = json["tiers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["level"].as_str().unwrap())
        .collect();
    assert_eq!(levels, vec!["good", "better", "best"]);
}

#[tokio::test]
async fn saved_proposal_lands_in_client_feed() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (status, saved) = post_json(
        &app,
        "/api/proposals",
        serde_json::json!({
            "client_email": "ada@example.com",
            "builder": { "project_type": "portfolio", "tier": "good" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{saved}");
    let id = saved["proposal"]["id"].as_i64().unwrap();

    let (status, fetched) = get(&app, &format!("/api/proposals/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["proposal"]["tier"], "good");
    assert_eq!(fetched["breakdown"]["display_total"], 750);

    let (_, feed) = get(&app, "/api/notifications?recipient=ada@example.com").await;
    assert_eq!(feed["total"], 1);
    let note_id = feed["items"][0]["id"].as_i64().unwrap();

    let (status, _) = post_json(
        &app,
        &format!("/api/notifications/{note_id}/read"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, feed) = get(&app, "/api/notifications?recipient=ada@example.com&unread=true").await;
    assert_eq!(feed["total"], 0);
    assert_eq!(feed["unread_count"], 0);
}

#[tokio::test]
async fn missing_proposal_is_404() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    let (status, _) = get(&app, "/api/proposals/41").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn read_all_marks_feed() {
    let dir = TempDir::new().unwrap();
    let app = clientdesk_server::build_router(dir.path().to_path_buf());
    for title in ["Welcome", "Kickoff"] {
        let (status, _) = post_json(
            &app,
            "/api/notifications",
            serde_json::json!({ "recipient": "bob@example.com", "kind": "message", "title": title }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, json) = post_json(
        &app,
        "/api/notifications/read-all",
        serde_json::json!({ "recipient": "bob@example.com" }),
    )
    .await;
    assert_eq!(json["marked"], 2);
}
