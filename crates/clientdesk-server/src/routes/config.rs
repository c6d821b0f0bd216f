use axum::extract::State;
use axum::Json;
use clientdesk_core::config::{BrandingConfig, Config, ConfigWarning};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// What the portal needs to render itself. Storage settings stay server-side.
#[derive(Debug, Serialize)]
pub struct PortalConfig {
    pub version: u32,
    pub branding: BrandingConfig,
    pub submit_url: String,
    pub retention_hours: u32,
    pub warnings: Vec<ConfigWarning>,
}

impl From<Config> for PortalConfig {
    fn from(config: Config) -> Self {
        let warnings = config.validate();
        Self {
            version: config.version,
            branding: config.branding,
            submit_url: config.intake.submit_url,
            retention_hours: config.intake.retention_hours,
            warnings,
        }
    }
}

/// GET /api/config
///
/// Read-only; the file is edited directly or created by `clientdesk init`.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<PortalConfig>, AppError> {
    let root = app.root.clone();
    let config = tokio::task::spawn_blocking(move || Config::load(&root))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(config.into()))
}
