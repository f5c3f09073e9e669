use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use workflow::AuthContext;

use crate::config::AuthConfig;
use crate::error::{ClientError, Result};

/// JWT claims issued by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub uid: String, // Account ID
    #[serde(default)]
    pub role: Option<String>,
    pub exp: usize, // Expiration timestamp
}

/// Sign a token. Used by tests and local tooling; production tokens come from
/// the auth provider.
pub fn sign(secret: &[u8], uid: &str, username: &str, role: &str, ttl: Duration) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| ClientError::InvalidResponse("token expiry out of range".into()))?
        .timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        uid: uid.to_owned(),
        role: Some(role.to_owned()),
        exp: expiration as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

/// Verify and decode a token.
pub fn verify(secret: &[u8], token: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(token_data.claims)
}

/// Build the auth context for the configured session.
///
/// No token yields an anonymous context. Without a `jwt_secret` the token is
/// passed through unverified and the backend's `whoami` decides who we are.
/// A token that fails verification is an error.
pub fn context_from_config(config: &AuthConfig) -> Result<AuthContext> {
    let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) else {
        return Ok(AuthContext::anonymous());
    };
    let Some(secret) = config.jwt_secret.as_deref() else {
        debug!("No jwt_secret configured, deferring identity to the backend");
        return Ok(AuthContext::anonymous().with_token(token));
    };

    let claims = verify(secret.as_bytes(), token)?;
    Ok(AuthContext {
        id: Some(claims.uid),
        role: claims.role,
        token: Some(token.to_owned()),
    })
}
