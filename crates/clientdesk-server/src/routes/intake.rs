use axum::{
    extract::{Path, State},
    Json,
};
use clientdesk_core::error::ClientdeskError;
use clientdesk_core::intake::{
    AnswerValue, Catalog, FileProgressStore, FlowSettings, FlowState, IntakeFlow, ReviewChoice,
    Transcript,
};
use clientdesk_core::submission::DbGateway;

use crate::error::AppError;
use crate::state::{AppState, IntakeSession};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// JSON view of a session. `messages` holds everything the engine rendered
/// since the previous response.
fn session_view(id: &str, flow: &mut IntakeSession) -> serde_json::Value {
    let state = flow.state();
    let mut view = serde_json::json!({
        "session_id": id,
        "state": state,
        "question": flow.rendered_question(),
        "progress": flow.progress(),
        "messages": flow.presenter_mut().drain(),
    });
    if matches!(state, FlowState::Review | FlowState::ReviewDeclined) {
        view["summary"] = serde_json::json!(flow.summary());
    }
    view
}

/// Lock the session map on the blocking pool and run `action` against one
/// live engine. A session that reaches `submitted` is dropped from the map
/// after its final view is built, which frees its client key.
async fn with_session<F>(
    app: &AppState,
    id: String,
    action: F,
) -> Result<Json<serde_json::Value>, AppError>
where
    F: FnOnce(&mut IntakeSession) -> clientdesk_core::Result<()> + Send + 'static,
{
    let sessions = app.sessions.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut sessions = sessions
            .lock()
            .map_err(|_| anyhow::anyhow!("session map lock poisoned"))?;
        let flow = sessions
            .get_mut(&id)
            .ok_or_else(|| ClientdeskError::SessionNotFound(id.clone()))?;
        match action(flow) {
            Ok(()) => {
                let view = session_view(&id, flow);
                if flow.state() == FlowState::Submitted {
                    sessions.remove(&id);
                    tracing::info!(session = %id, "intake session submitted and closed");
                }
                Ok::<_, anyhow::Error>(view)
            }
            Err(e) => {
                // The error body carries the message; don't replay it next time.
                flow.presenter_mut().drain();
                Err(e.into())
            }
        }
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Create / get / delete
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize, Default)]
pub struct CreateSessionBody {
    /// Names the saved-progress slot. Reusing a key offers to resume.
    #[serde(default)]
    pub client_key: Option<String>,
}

/// POST /api/intake/sessions: start a new conversation.
pub async fn create_session(
    State(app): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let key = body.client_key.unwrap_or_else(|| id.clone());
    let result = tokio::task::spawn_blocking(move || {
        let config = app.config()?;
        let store = FileProgressStore::new(&app.root, &key)?;

        let mut sessions = app
            .sessions
            .lock()
            .map_err(|_| anyhow::anyhow!("session map lock poisoned"))?;
        if sessions.values().any(|s| s.store().path() == store.path()) {
            return Err(AppError::conflict(format!(
                "a live session already uses client key '{key}'"
            )));
        }

        let mut flow = IntakeFlow::new(
            Catalog::shared(),
            store,
            Transcript::new(),
            FlowSettings::from_config(&config),
        );
        flow.start();
        let view = session_view(&id, &mut flow);
        tracing::info!(session = %id, client_key = %key, state = %flow.state(), "intake session started");
        sessions.insert(id, flow);
        Ok::<_, AppError>(view)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}

/// GET /api/intake/sessions/{id}
pub async fn get_session(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    with_session(&app, id, |_| Ok(())).await
}

/// DELETE /api/intake/sessions/{id}: drop the live engine. Saved progress
/// stays on disk so the client can resume later.
pub async fn delete_session(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = app
        .sessions
        .lock()
        .map_err(|_| anyhow::anyhow!("session map lock poisoned"))?
        .remove(&id)
        .is_some();
    if !removed {
        return Err(ClientdeskError::SessionNotFound(id).into());
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ---------------------------------------------------------------------------
// Conversation steps
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct ResumeBody {
    pub resume: bool,
}

/// POST /api/intake/sessions/{id}/resume
pub async fn resume(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ResumeBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    with_session(&app, id, move |flow| flow.resume(body.resume).map(|_| ())).await
}

#[derive(serde::Deserialize)]
pub struct AnswerBody {
    pub value: AnswerValue,
}

/// POST /api/intake/sessions/{id}/answer: `value` is a string or a list.
pub async fn answer(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AnswerBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    with_session(&app, id, move |flow| {
        flow.submit_answer(body.value).map(|_| ())
    })
    .await
}

#[derive(serde::Deserialize)]
pub struct ToggleBody {
    pub value: String,
}

/// POST /api/intake/sessions/{id}/toggle: stage or unstage one option.
pub async fn toggle(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ToggleBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    with_session(&app, id, move |flow| {
        flow.toggle_option(&body.value).map(|_| ())
    })
    .await
}

/// POST /api/intake/sessions/{id}/confirm-selection
pub async fn confirm_selection(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    with_session(&app, id, |flow| flow.confirm_selection().map(|_| ())).await
}

#[derive(serde::Deserialize)]
pub struct EditBody {
    pub position: usize,
}

/// POST /api/intake/sessions/{id}/edit: rewind to an earlier question.
pub async fn edit(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EditBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    with_session(&app, id, move |flow| {
        flow.edit_answer(body.position).map(|_| ())
    })
    .await
}

#[derive(serde::Deserialize)]
pub struct ReviewBody {
    pub confirm: bool,
}

/// POST /api/intake/sessions/{id}/review: confirm (submit) or decline.
///
/// Server-hosted sessions submit straight into the local database.
pub async fn review(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let state = app.clone();
    with_session(&app, id, move |flow| {
        let gateway = DbGateway::new(state.database_path()?);
        flow.confirm_review(body.confirm, &gateway).map(|_| ())
    })
    .await
}

#[derive(serde::Deserialize)]
pub struct ReviewChoiceBody {
    pub choice: ReviewChoice,
}

/// POST /api/intake/sessions/{id}/review/choice: `summary` or `restart`.
pub async fn review_choice(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ReviewChoiceBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    with_session(&app, id, move |flow| {
        flow.review_choice(body.choice).map(|_| ())
    })
    .await
}
