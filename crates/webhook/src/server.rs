//! HTTP host for the solvers
//!
//! cert-manager posts a `ChallengePayload` to
//! `/apis/{group}/v1alpha1/{solver}` and reads the outcome back from the
//! `response` field of the echoed payload. Solver failures are reported
//! there, with HTTP status 200; only routing and decoding problems produce
//! an HTTP error.

use crate::error::{HttpError, Result};
use acmehook_core::{ChallengeAction, ChallengeRequest, Solver, SolverError, SolverResult};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Envelope exchanged with cert-manager
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub uid: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

/// Kubernetes-style status attached to failed responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    pub message: String,
    pub reason: String,
    pub code: u16,
}

impl ChallengeResponse {
    pub fn from_result(uid: &str, result: &SolverResult<()>) -> Self {
        Self {
            uid: uid.to_string(),
            success: result.is_ok(),
            status: result.as_ref().err().map(Status::failure),
        }
    }
}

impl Status {
    fn failure(err: &SolverError) -> Self {
        let (reason, code) = match err {
            SolverError::ConfigDecode(_) => ("BadRequest", 400),
            SolverError::Credential(_) => ("Unauthorized", 401),
            SolverError::RecordNotFound { .. } => ("NotFound", 404),
            SolverError::NotInitialized | SolverError::ShuttingDown => ("ServiceUnavailable", 503),
            SolverError::Provider { .. } | SolverError::AlreadyInitialized => {
                ("InternalError", 500)
            }
        };

        Self {
            status: "Failure".to_string(),
            message: err.to_string(),
            reason: reason.to_string(),
            code,
        }
    }
}

/// Shared router state
#[derive(Clone)]
pub struct AppState {
    group: Arc<str>,
    solvers: Arc<HashMap<String, Arc<dyn Solver>>>,
}

impl AppState {
    pub fn new(group: &str, solvers: impl IntoIterator<Item = Arc<dyn Solver>>) -> Self {
        let solvers = solvers
            .into_iter()
            .map(|solver| (solver.name().to_string(), solver))
            .collect();

        Self {
            group: Arc::from(group),
            solvers: Arc::new(solvers),
        }
    }

    pub fn solvers(&self) -> impl Iterator<Item = &Arc<dyn Solver>> {
        self.solvers.values()
    }

    fn solver(&self, group: &str, name: &str) -> Result<Arc<dyn Solver>> {
        if group != &*self.group {
            return Err(HttpError::NotFound(format!("API group {group}")));
        }
        self.solvers
            .get(name)
            .cloned()
            .ok_or_else(|| HttpError::NotFound(format!("solver {name}")))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/apis/{group}/v1alpha1/{solver}", post(solve))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn solve(
    State(state): State<AppState>,
    Path((group, name)): Path<(String, String)>,
    payload: std::result::Result<Json<ChallengePayload>, JsonRejection>,
) -> Result<Json<ChallengePayload>> {
    let solver = state.solver(&group, &name)?;
    let Json(mut payload) = payload.map_err(|e| HttpError::BadRequest(e.body_text()))?;

    let request = payload
        .request
        .as_ref()
        .ok_or_else(|| HttpError::BadRequest("payload has no request".to_string()))?;
    let action = request
        .action
        .ok_or_else(|| HttpError::BadRequest("request has no action".to_string()))?;

    info!(
        uid = %request.uid,
        solver = %name,
        action = ?action,
        fqdn = %request.resolved_fqdn,
        "Handling challenge"
    );

    let result = match action {
        ChallengeAction::Present => solver.present(request).await,
        ChallengeAction::CleanUp => solver.clean_up(request).await,
    };

    if let Err(e) = &result {
        warn!(uid = %request.uid, solver = %name, error = %e, "Challenge failed");
    }

    let response = ChallengeResponse::from_result(&request.uid, &result);
    payload.response = Some(response);
    Ok(Json(payload))
}
