use crate::auth::models::{SessionClaims, SessionContext};
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use casedesk_core::AppError;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthState {
    /// HS256 verification with the shared session secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Session has expired".to_string())
                    }
                    _ => AppError::Unauthorized("Invalid session token".to_string()),
                }
            })
    }
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match bearer_token(&request).and_then(|t| auth_state.validate_token(t)) {
        Ok(claims) => claims,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let session = SessionContext::from(claims);
    tracing::debug!(user_id = %session.user_id, "Session verified");
    request.extensions_mut().insert(session);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-min-32-characters-long-for-testing";

    fn token(secret: &str, exp_offset: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            user_type: Some("staff".to_string()),
            exp: now + exp_offset,
            iat: now,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token() {
        let claims = AuthState::new(SECRET).validate_token(&token(SECRET, 3600)).unwrap();
        assert_eq!(claims.user_type.as_deref(), Some("staff"));
    }

    #[test]
    fn test_expired_token() {
        let err = AuthState::new(SECRET)
            .validate_token(&token(SECRET, -3600))
            .unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_wrong_secret() {
        let other = "another-secret-key-that-is-32-characters-or-more";
        let err = AuthState::new(SECRET)
            .validate_token(&token(other, 3600))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
