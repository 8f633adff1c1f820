//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, warn};

use crate::auth::{AuthenticatedUser, BearerVerifier, authenticate, unauthorized_response};
use crate::token::{RetrieveToken, SaveToken, SaveTokenRequest};

const SAVE_ERROR: &str = "Could not save token";
const RETRIEVE_ERROR: &str = "Could not retrieve token";
const SAVE_OK: &str = "Token saved successfully";

/// Shared application state
pub struct AppState {
    /// Token writer
    pub saver: Arc<dyn SaveToken>,
    /// Token reader
    pub retriever: Arc<dyn RetrieveToken>,
}

/// Create the router
///
/// `/token/*` sits behind the authentication gate; `/health` does not.
pub fn create_router(
    state: Arc<AppState>,
    verifier: Arc<dyn BearerVerifier>,
    max_body_size: usize,
) -> Router {
    Router::new()
        .route("/token/save", put(save_token_handler))
        .route("/token/get", get(retrieve_token_handler))
        .layer(middleware::from_fn_with_state(verifier, authenticate))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// PUT /token/save
async fn save_token_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Result<Json<SaveTokenRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(user_id = %user.user_id, error = %rejection, "Rejected save request body");
            return error_response(StatusCode::BAD_REQUEST, SAVE_ERROR);
        }
    };

    if !request.is_complete() {
        warn!(user_id = %user.user_id, "Save request has empty fields");
        return error_response(StatusCode::BAD_REQUEST, SAVE_ERROR);
    }

    if request.user_id != user.user_id {
        warn!(
            user_id = %user.user_id,
            requested = %request.user_id,
            "Save request targets another user"
        );
        return unauthorized_response();
    }

    match state.saver.save_token(&request.user_id, &request.token()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "Message": SAVE_OK }))).into_response(),
        Err(e) => {
            error!(user_id = %user.user_id, error = %e, "Failed to save token");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, SAVE_ERROR)
        }
    }
}

/// GET /token/get
async fn retrieve_token_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Response {
    let Some(Extension(user)) = user else {
        return error_response(StatusCode::UNAUTHORIZED, RETRIEVE_ERROR);
    };

    match state.retriever.retrieve_token(&user.user_id).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => {
            error!(user_id = %user.user_id, error = %e, "Failed to retrieve token");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, RETRIEVE_ERROR)
        }
    }
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "Error": message }))).into_response()
}
