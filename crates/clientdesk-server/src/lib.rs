pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on` and by the integration tests.
pub fn build_router(root: PathBuf) -> Router {
    let app_state = state::AppState::new(root);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/config", get(routes::config::get_config))
        // Intake sessions
        .route(
            "/api/intake/sessions",
            post(routes::intake::create_session),
        )
        .route(
            "/api/intake/sessions/{id}",
            get(routes::intake::get_session).delete(routes::intake::delete_session),
        )
        .route(
            "/api/intake/sessions/{id}/resume",
            post(routes::intake::resume),
        )
        .route(
            "/api/intake/sessions/{id}/answer",
            post(routes::intake::answer),
        )
        .route(
            "/api/intake/sessions/{id}/toggle",
            post(routes::intake::toggle),
        )
        .route(
            "/api/intake/sessions/{id}/confirm-selection",
            post(routes::intake::confirm_selection),
        )
        .route(
            "/api/intake/sessions/{id}/edit",
            post(routes::intake::edit),
        )
        .route(
            "/api/intake/sessions/{id}/review",
            post(routes::intake::review),
        )
        .route(
            "/api/intake/sessions/{id}/review/choice",
            post(routes::intake::review_choice),
        )
        // Submissions
        .route(
            "/api/submissions",
            get(routes::submissions::list_submissions).post(routes::submissions::create_submission),
        )
        // Proposals
        .route(
            "/api/proposals/tiers/{project_type}",
            get(routes::proposals::get_tiers),
        )
        .route("/api/proposals/quote", post(routes::proposals::quote))
        .route("/api/proposals", post(routes::proposals::create_proposal))
        .route("/api/proposals/{id}", get(routes::proposals::get_proposal))
        // Notifications
        .route(
            "/api/notifications",
            get(routes::notifications::list_notifications)
                .post(routes::notifications::create_notification),
        )
        .route(
            "/api/notifications/read-all",
            post(routes::notifications::mark_all_read),
        )
        .route(
            "/api/notifications/{id}/read",
            post(routes::notifications::mark_read),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Bring the database schema up to date before accepting requests.
async fn prepare(root: PathBuf) -> anyhow::Result<()> {
    let applied = tokio::task::spawn_blocking(move || {
        let state = state::AppState::new(root);
        let mut db = clientdesk_core::db::Database::open(&state.database_path()?)?;
        clientdesk_core::migrations::Migrator::new(&mut db).migrate_up()
    })
    .await??;
    if !applied.is_empty() {
        tracing::info!(?applied, "database migrated");
    }
    Ok(())
}

/// Migrate the database, then serve on an already-bound listener so the
/// caller controls the address (and can pass port 0).
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    prepare(root.clone()).await?;
    let app = build_router(root);

    tracing::info!("clientdesk server listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/health");
        if let Err(e) = open::that(&url) {
            tracing::warn!("could not open browser: {e}");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
