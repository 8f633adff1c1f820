//! Bearer token authentication.

pub mod middleware;
pub mod verifier;

pub use middleware::{AuthenticatedUser, authenticate, unauthorized_response};
pub use verifier::{BearerVerifier, JwtVerifier, VerifyError};
