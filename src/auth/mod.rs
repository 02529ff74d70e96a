pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Discriminates the two credential kinds so a refresh token can never be
/// replayed where an access token is expected (and vice versa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub token_use: TokenUse,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Wrong token type")]
    WrongTokenUse,

    #[error("Token secret not configured")]
    MissingSecret,
}

fn secret_for(token_use: TokenUse) -> Result<&'static str, AuthError> {
    let security = &config::config().security;
    let secret = match token_use {
        TokenUse::Access => &security.access_token_secret,
        TokenUse::Refresh => &security.refresh_token_secret,
    };
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    Ok(secret)
}

/// Mint a short-lived access token carrying the user identity
pub fn mint_access_token(user_id: Uuid, username: &str) -> Result<String, AuthError> {
    let ttl = Duration::minutes(config::config().security.access_token_ttl_mins);
    mint(user_id, username, TokenUse::Access, ttl)
}

/// Mint a long-lived refresh token; the caller persists it on the user record
pub fn mint_refresh_token(user_id: Uuid, username: &str) -> Result<String, AuthError> {
    let ttl = Duration::days(config::config().security.refresh_token_ttl_days);
    mint(user_id, username, TokenUse::Refresh, ttl)
}

fn mint(user_id: Uuid, username: &str, token_use: TokenUse, ttl: Duration) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        token_use,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    let key = EncodingKey::from_secret(secret_for(token_use)?.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|_| AuthError::Invalid)
}

/// Validate signature and expiry, and check the token is of the expected kind
pub fn verify_token(token: &str, expected_use: TokenUse) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(secret_for(expected_use)?.as_bytes());
    let validation = Validation::default();

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Invalid,
    })?;

    if data.claims.token_use != expected_use {
        return Err(AuthError::WrongTokenUse);
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_roundtrip() {
        let id = Uuid::new_v4();
        let token = mint_access_token(id, "alice").unwrap();
        let claims = verify_token(&token, TokenUse::Access).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.token_use, TokenUse::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let id = Uuid::new_v4();
        let token = mint_refresh_token(id, "bob").unwrap();
        let claims = verify_token(&token, TokenUse::Refresh).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.token_use, TokenUse::Refresh);
    }

    #[test]
    fn refresh_token_rejected_as_access_token() {
        // Different signing secrets, so the signature check alone fails
        let token = mint_refresh_token(Uuid::new_v4(), "carol").unwrap();
        assert!(verify_token(&token, TokenUse::Access).is_err());
    }

    #[test]
    fn access_token_rejected_as_refresh_token() {
        let token = mint_access_token(Uuid::new_v4(), "dave").unwrap();
        assert!(verify_token(&token, TokenUse::Refresh).is_err());
    }

    #[test]
    fn tampered_token_rejected() {
        let token = mint_access_token(Uuid::new_v4(), "eve").unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');
        assert!(matches!(
            verify_token(&tampered, TokenUse::Access),
            Err(AuthError::Invalid)
        ));
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(verify_token("not.a.jwt", TokenUse::Access).is_err());
    }
}
