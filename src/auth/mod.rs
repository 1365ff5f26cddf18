use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// Name of the session cookie carried by every admin request
pub const SESSION_COOKIE: &str = "party_admin_session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String) -> Self {
        let now = Utc::now();
        let expiry_mins = config::config().security.session_expiry_mins;
        Self {
            sub: user_id,
            email,
            exp: (now + Duration::minutes(expiry_mins as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session secret not configured")]
    MissingSecret,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),
}

/// Sign a session token for the given identity
pub fn issue_token(user_id: Uuid, email: &str) -> Result<String, SessionError> {
    let secret = &config::config().security.session_secret;
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }
    let claims = Claims::new(user_id, email.to_string());
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| SessionError::InvalidToken(e.to_string()))
}

/// Validate a session token. Any failure - bad signature, expiry,
/// malformed input - is an error; callers treat it as no identity.
pub fn verify_token(token: &str) -> Result<Claims, SessionError> {
    let secret = &config::config().security.session_secret;
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }
    let validation = Validation::default();
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| SessionError::InvalidToken(e.to_string()))
}

/// Exchange a valid token for a fresh one with a renewed expiry
/// (sliding session window)
pub fn refresh_token(token: &str) -> Result<(Claims, String), SessionError> {
    let claims = verify_token(token)?;
    let renewed = issue_token(claims.sub, &claims.email)?;
    Ok((claims, renewed))
}
