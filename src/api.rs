use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    api_error,
    errors::{ApiError, ErrorContext},
    models::*,
    session_service::{SessionService, SubmitError},
};

// Import logging macros
use crate::{log_api_error, log_api_start, log_api_success, log_api_warn};

#[derive(Clone)]
pub struct AppState {
    pub session_service: SessionService,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub provider: String,
    pub model: String,
    pub sessions: usize,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let client = state.session_service.plan_client();
    Json(ApiResponse::success(HealthStatus {
        status: "ok",
        provider: client.provider_name().to_string(),
        model: client.model_name().to_string(),
        sessions: state.session_service.session_count(),
    }))
}

/// One-shot generation without a session
pub async fn generate_plan(
    State(state): State<AppState>,
    Json(request): Json<GeneratePlanRequest>,
) -> ApiResult<StudyPlanResponse> {
    log_api_start!("generate_plan");

    match state
        .session_service
        .plan_client()
        .generate(&request.content, request.days)
        .await
    {
        Ok(plan) => {
            log_api_success!("generate_plan", days = plan.total_days, "plan generated");
            Ok(Json(ApiResponse::success(plan)))
        }
        Err(failure) => {
            log_api_error!("generate_plan", error = failure, "plan generation failed");
            Err(api_error!(generation, "generate_plan", "plan", failure))
        }
    }
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<SessionSnapshot>>) {
    let snapshot = state.session_service.create_session();
    log_api_success!("create_session", session_id = snapshot.session_id, "session created");
    (StatusCode::CREATED, Json(ApiResponse::success(snapshot)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionSnapshot> {
    log_api_start!("get_session", session_id = id);

    match state.session_service.get_session(id) {
        Some(snapshot) => Ok(Json(ApiResponse::success(snapshot))),
        None => {
            log_api_warn!("get_session", session_id = id, "session not found");
            Err(api_error!(not_found, "get_session", "session", id))
        }
    }
}

/// Start a generation attempt for a session.
///
/// Responds as soon as the session is `Generating`; poll the session for the outcome.
pub async fn submit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GeneratePlanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionSnapshot>>), (StatusCode, Json<ApiResponse<()>>)> {
    log_api_start!("submit_session", session_id = id);

    match state.session_service.submit(id, request.content, request.days) {
        Ok((snapshot, _handle)) => {
            log_api_success!("submit_session", session_id = id, "generation started");
            Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(snapshot))))
        }
        Err(SubmitError::NotFound(_)) => Err(api_error!(not_found, "submit_session", "session", id)),
        Err(error @ SubmitError::InProgress(_)) => {
            Err(api_error!(conflict, "submit_session", "session", id, error))
        }
        Err(error @ SubmitError::InvalidDayCount(_)) => Err(ApiError::ValidationError(error.to_string())
            .to_response_with_context(ErrorContext::new("submit_session", "session").with_id(&id.to_string()))),
        Err(error @ SubmitError::EmptyInput) => Err(ApiError::ValidationError(error.to_string())
            .to_response_with_context(
                ErrorContext::new("submit_session", "session")
                    .with_id(&id.to_string())
                    .with_user_message("Paste or upload some study material first."),
            )),
    }
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<bool> {
    log_api_start!("delete_session", session_id = id);

    if state.session_service.remove_session(id) {
        log_api_success!("delete_session", session_id = id, "session removed");
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(api_error!(not_found, "delete_session", "session", id))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // Plan routes
        .route("/api/plans", post(generate_plan))
        // Session routes
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/submit", post(submit_session))
        .with_state(state)
}
