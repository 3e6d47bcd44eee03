//! HTTP API server exposing the session lifecycle.
//!
//! Routes:
//! - `POST /sessions/spawn` - start a session for an agent (201, or 404 when
//!   the agent does not exist)
//! - `GET /subagents?action=list` - list running sessions with owners joined
//! - `POST /subagents` - `{"action": "kill"|"steer", "target": <session id>}`
//!   (404 when the target does not resolve)

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::commands::sessions::{
    self, DEFAULT_SESSION_LIMIT, SessionCompleteResult, SessionSpawnArgs,
};
use crate::models::Priority;
use crate::storage::Storage;
use crate::Error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Store handle, serialized behind a mutex
    pub storage: Arc<Mutex<Storage>>,
}

/// Start the API server. Blocks until shutdown.
pub fn run(repo_path: &Path, host: &str, port: u16) -> crate::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let storage = Storage::open(repo_path)?;
    let state = AppState {
        storage: Arc::new(Mutex::new(storage)),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async move {
        let app = router(state);

        let host_addr: std::net::IpAddr = host
            .parse()
            .map_err(|e| Error::Other(format!("Invalid host address '{}': {}", host, e)))?;
        let addr = SocketAddr::from((host_addr, port));
        info!("Listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(Error::Io)?;
        axum::serve(listener, app).await.map_err(Error::Io)?;
        Ok(())
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/sessions/spawn", post(spawn_session))
        .route("/subagents", get(list_subagents))
        .route("/subagents", post(subagent_action))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SpawnRequest {
    agent_id: String,
    task_title: String,
    #[serde(default)]
    task_description: Option<String>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    estimated_duration: Option<i64>,
    #[serde(default)]
    estimated_cost: Option<f64>,
}

async fn spawn_session(
    State(state): State<AppState>,
    Json(req): Json<SpawnRequest>,
) -> impl IntoResponse {
    let args = SessionSpawnArgs {
        agent_id: req.agent_id,
        task_title: req.task_title,
        task_description: req.task_description,
        priority: req.priority.unwrap_or(Priority::Medium),
        estimated_duration: req.estimated_duration,
        estimated_cost: req.estimated_cost,
    };

    let mut storage = state.storage.lock().await;
    match sessions::session_spawn(&mut storage, args) {
        Ok(spawned) => {
            info!(session_id = %spawned.session_id, agent_id = %spawned.agent_id, "spawned session");
            (StatusCode::CREATED, Json(serde_json::json!(spawned)))
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct SubagentQuery {
    action: String,
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn list_subagents(
    State(state): State<AppState>,
    Query(query): Query<SubagentQuery>,
) -> impl IntoResponse {
    if query.action != "list" {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("Unknown action: {}", query.action)
            })),
        );
    }

    let storage = state.storage.lock().await;
    match sessions::session_list_running(
        &storage,
        query.agent_id.as_deref(),
        query.limit.unwrap_or(DEFAULT_SESSION_LIMIT),
    ) {
        Ok(list) => (StatusCode::OK, Json(serde_json::json!(list))),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct SubagentAction {
    action: String,
    /// Session id the action applies to
    target: String,
    #[serde(default)]
    message: Option<String>,
}

async fn subagent_action(
    State(state): State<AppState>,
    Json(req): Json<SubagentAction>,
) -> impl IntoResponse {
    let mut storage = state.storage.lock().await;

    let result = match req.action.as_str() {
        "kill" => sessions::session_kill(&mut storage, &req.target),
        "steer" => {
            let Some(message) = req.message.as_deref() else {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": "steer requires a message" })),
                );
            };
            sessions::session_steer(&mut storage, &req.target, message)
        }
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!("Unknown action: {}", other)
                })),
            );
        }
    };

    match result {
        Ok(Some(done)) => {
            info!(session_id = %done.session_id, status = %done.status, "session finished");
            (
                StatusCode::OK,
                Json(serde_json::json!(SessionCompleteResult::from(Some(done)))),
            )
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("No such session: {}", req.target)
            })),
        ),
        Err(e) => error_response(e),
    }
}

fn error_response(e: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) | Error::InvalidId(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_request_defaults() {
        let req: SpawnRequest = serde_json::from_str(
            r#"{"agent_id": "agt-aaaa01", "task_title": "research"}"#,
        )
        .unwrap();
        assert_eq!(req.agent_id, "agt-aaaa01");
        assert!(req.priority.is_none());
        assert!(req.estimated_cost.is_none());
    }

    #[test]
    fn test_subagent_action_deserializes() {
        let req: SubagentAction = serde_json::from_str(
            r#"{"action": "steer", "target": "ses-aaaa01", "message": "focus"}"#,
        )
        .unwrap();
        assert_eq!(req.action, "steer");
        assert_eq!(req.target, "ses-aaaa01");
        assert_eq!(req.message.as_deref(), Some("focus"));
    }

    #[test]
    fn test_subagent_kill_needs_only_target() {
        let req: SubagentAction =
            serde_json::from_str(r#"{"action": "kill", "target": "ses-aaaa01"}"#).unwrap();
        assert_eq!(req.action, "kill");
        assert!(req.message.is_none());
    }

    #[test]
    fn test_spawn_request_rejects_missing_title() {
        let result: Result<SpawnRequest, _> =
            serde_json::from_str(r#"{"agent_id": "agt-aaaa01"}"#);
        assert!(result.is_err());
    }
}
