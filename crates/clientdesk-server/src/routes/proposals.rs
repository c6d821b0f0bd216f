use axum::{
    extract::{Path, State},
    Json,
};
use clientdesk_core::proposal::{display_amount, tiers_for, PriceBreakdown, ProposalBuilder};

use crate::error::AppError;
use crate::state::AppState;

fn breakdown_to_json(breakdown: &PriceBreakdown) -> serde_json::Value {
    let mut json = serde_json::json!(breakdown);
    json["display_total"] = serde_json::json!(display_amount(breakdown.total));
    json
}

/// GET /api/proposals/tiers/{project_type}: unknown types get the `other` packages.
pub async fn get_tiers(Path(project_type): Path<String>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "project_type": project_type,
        "tiers": tiers_for(&project_type),
    }))
}

/// POST /api/proposals/quote: price a selection without saving it.
pub async fn quote(Json(builder): Json<ProposalBuilder>) -> Result<Json<serde_json::Value>, AppError> {
    let breakdown = builder.calculate()?;
    Ok(Json(breakdown_to_json(&breakdown)))
}

#[derive(serde::Deserialize)]
pub struct SaveProposalBody {
    pub client_email: String,
    #[serde(default)]
    pub submission_id: Option<i64>,
    pub builder: ProposalBuilder,
}

/// POST /api/proposals: save and notify the client.
pub async fn create_proposal(
    State(app): State<AppState>,
    Json(body): Json<SaveProposalBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = tokio::task::spawn_blocking(move || {
        let mut db = app.open_db()?;
        let record = clientdesk_core::proposal::store::save(
            &mut db,
            body.client_email.trim(),
            body.submission_id,
            &body.builder,
        )?;
        let breakdown = record.breakdown()?;
        Ok::<_, clientdesk_core::ClientdeskError>(serde_json::json!({
            "proposal": record,
            "breakdown": breakdown_to_json(&breakdown),
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}

/// GET /api/proposals/{id}
pub async fn get_proposal(
    State(app): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = tokio::task::spawn_blocking(move || {
        let db = app.open_db()?;
        let record = clientdesk_core::proposal::store::get(db.conn(), id)?;
        let breakdown = record.breakdown()?;
        Ok::<_, clientdesk_core::ClientdeskError>(serde_json::json!({
            "proposal": record,
            "breakdown": breakdown_to_json(&breakdown),
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}
