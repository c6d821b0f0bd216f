use axum::{
    extract::{Path, Query, State},
    Json,
};
use clientdesk_core::db::PageRequest;
use clientdesk_core::notification::{self, NewNotification};

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub recipient: Option<String>,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// GET /api/notifications?recipient=&unread=&page=&per_page=
pub async fn list_notifications(
    State(app): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Some(recipient) = query.recipient.filter(|r| !r.trim().is_empty()) else {
        return Err(AppError::bad_request("recipient is required"));
    };
    let request = PageRequest::new(query.page, query.per_page);
    let unread_only = query.unread;
    let result = tokio::task::spawn_blocking(move || {
        let db = app.open_db()?;
        let page = notification::list(db.conn(), &recipient, unread_only, request)?;
        let unread = notification::unread_count(db.conn(), &recipient)?;
        let mut json = serde_json::to_value(page)?;
        json["unread_count"] = serde_json::json!(unread);
        Ok::<_, clientdesk_core::ClientdeskError>(json)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}

/// POST /api/notifications: post a message to a recipient's feed.
pub async fn create_notification(
    State(app): State<AppState>,
    Json(body): Json<NewNotification>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = tokio::task::spawn_blocking(move || {
        let db = app.open_db()?;
        let created = notification::create(db.conn(), &body)?;
        Ok::<_, clientdesk_core::ClientdeskError>(serde_json::to_value(created)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(app): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = tokio::task::spawn_blocking(move || {
        let db = app.open_db()?;
        let updated = notification::mark_read(db.conn(), id)?;
        Ok::<_, clientdesk_core::ClientdeskError>(serde_json::to_value(updated)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct ReadAllBody {
    pub recipient: String,
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(app): State<AppState>,
    Json(body): Json<ReadAllBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = tokio::task::spawn_blocking(move || {
        let db = app.open_db()?;
        let marked = notification::mark_all_read(db.conn(), &body.recipient)?;
        Ok::<_, clientdesk_core::ClientdeskError>(serde_json::json!({ "marked": marked }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}
