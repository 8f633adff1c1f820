//! Authentication gate
//!
//! Every protected route passes through [`authenticate`]: the request must
//! carry `Authorization: Bearer <token>`, the token must verify, and the
//! verified subject is attached to the request as an [`AuthenticatedUser`].
//! Any failure ends the request with the same opaque 401.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, warn};

use super::verifier::BearerVerifier;

/// Body message for every authentication failure.
pub const AUTH_ERROR_MESSAGE: &str = "Could not authenticate user";

const BEARER_PREFIX: &str = "Bearer ";

/// Identity resolved by the gate, valid for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The token's `sub` claim.
    pub user_id: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(unauthorized_response)
    }
}

/// Authentication middleware
pub async fn authenticate(
    State(verifier): State<Arc<dyn BearerVerifier>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    let verified = match extract_bearer(request.headers()) {
        Ok(token) => verifier.verify(token),
        Err(reason) => {
            warn!(path = %path, reason, "Rejected request");
            return unauthorized_response();
        }
    };

    match verified {
        Ok(user_id) => {
            debug!(user_id = %user_id, path = %path, "Authenticated request");
            request.extensions_mut().insert(AuthenticatedUser { user_id });
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Invalid token");
            unauthorized_response()
        }
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// The error is a short reason for the log line.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("Authorization header is missing")?;

    let value = value
        .to_str()
        .map_err(|_| "Authorization header is not valid ASCII")?;

    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err("Invalid authorization header format"),
    }
}

/// Create a 401 Unauthorized response
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({ "Error": AUTH_ERROR_MESSAGE })),
    )
        .into_response()
}
