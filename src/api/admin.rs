//! Admin authentication.
//!
//! Every `/api/admin` route requires `Authorization: Bearer <token>`
//! matching the provisioned `ADMIN_TOKEN`. Tokens are compared through
//! SHA-256 digests so the comparison does not leak where the strings
//! diverge.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::state::AppState;

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or("");

    if !token_matches(presented, &state.config.admin_token) {
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

fn token_matches(presented: &str, expected: &str) -> bool {
    if presented.is_empty() {
        return false;
    }
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_token_passes() {
        assert!(token_matches("s3cret-admin-token", "s3cret-admin-token"));
    }

    #[test]
    fn test_wrong_token_fails() {
        assert!(!token_matches("guess", "s3cret-admin-token"));
        assert!(!token_matches("s3cret-admin-token ", "s3cret-admin-token"));
    }

    #[test]
    fn test_empty_token_fails_even_against_empty() {
        assert!(!token_matches("", ""));
        assert!(!token_matches("", "s3cret-admin-token"));
    }
}
