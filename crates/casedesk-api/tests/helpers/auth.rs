use casedesk_api::auth::SessionClaims;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use uuid::Uuid;

/// Session secret shared with the test config.
pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long-for-testing";

fn sign(claims: &SessionClaims, secret: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Token valid for one hour.
pub fn session_token(user_id: Uuid) -> String {
    let now = Utc::now().timestamp();
    sign(
        &SessionClaims {
            sub: user_id,
            user_type: Some("staff".to_string()),
            exp: now + 3600,
            iat: now,
        },
        TEST_JWT_SECRET,
    )
}

pub fn expired_token() -> String {
    let now = Utc::now().timestamp();
    sign(
        &SessionClaims {
            sub: Uuid::new_v4(),
            user_type: None,
            exp: now - 3600,
            iat: now - 7200,
        },
        TEST_JWT_SECRET,
    )
}

pub fn foreign_token() -> String {
    let now = Utc::now().timestamp();
    sign(
        &SessionClaims {
            sub: Uuid::new_v4(),
            user_type: None,
            exp: now + 3600,
            iat: now,
        },
        "a-different-secret-that-is-also-32-characters",
    )
}
