//! Bearer-token auth (§6: "full JWT validation is out of scope"). The middleware only
//! needs to turn an opaque bearer token into a participant identity string; `TokenValidator`
//! is the seam a real deployment replaces with actual JWT/OAuth verification.
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use common::error::AppError;

use crate::{api_state::ApiState, error::ApiError};

#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<String, AppError>;
}

/// Treats the bearer token as the participant identity directly — deterministic, no
/// cryptographic verification, the default for tests and single-operator deployments
/// the way §6 describes.
pub struct DeterministicTokenValidator;

#[async_trait]
impl TokenValidator for DeterministicTokenValidator {
    async fn resolve(&self, token: &str) -> Result<String, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::PermissionDenied("empty bearer token".into()));
        }
        Ok(token.trim().to_string())
    }
}

/// The identity resolved from the bearer token, inserted as a request extension for
/// handlers to read via `Extension<CallerIdentity>`.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub String);

pub async fn bearer_auth(
    State(state): State<ApiState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&request)
        .ok_or_else(|| ApiError::from(AppError::PermissionDenied("missing bearer token".into())))?;

    let identity = state.token_validator.resolve(&token).await?;
    request.extensions_mut().insert(CallerIdentity(identity));

    Ok(next.run(request).await)
}

fn extract_bearer(request: &Request) -> Option<String> {
    request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let validator = DeterministicTokenValidator;
        let err = validator.resolve("").await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn nonempty_token_resolves_to_itself() {
        let validator = DeterministicTokenValidator;
        let identity = validator.resolve("alice").await.unwrap();
        assert_eq!(identity, "alice");
    }
}
