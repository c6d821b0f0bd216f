use axum::{
    extract::{Query, State},
    Json,
};
use clientdesk_core::db::PageRequest;
use clientdesk_core::intake::Submission;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

/// POST /api/submissions: the collection endpoint intake gateways post to.
pub async fn create_submission(
    State(app): State<AppState>,
    Json(body): Json<Submission>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = tokio::task::spawn_blocking(move || {
        let mut db = app.open_db()?;
        let stored = clientdesk_core::submission::record(&mut db, &body)?;
        Ok::<_, clientdesk_core::ClientdeskError>(serde_json::json!({
            "id": stored.id,
            "status": "received",
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}

/// GET /api/submissions: newest first, paginated.
pub async fn list_submissions(
    State(app): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = tokio::task::spawn_blocking(move || {
        let db = app.open_db()?;
        let page = clientdesk_core::submission::list(db.conn(), query.request())?;
        Ok::<_, clientdesk_core::ClientdeskError>(serde_json::to_value(page)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}
