use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::{self, TokenUse};
use crate::db;
use crate::error::ApiError;
use crate::models::{User, UserPublic};

/// Authenticated caller, resolved from the access token and loaded from the
/// database so a deleted user cannot keep using an unexpired token.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserPublic);

impl CurrentUser {
    pub fn id(&self) -> uuid::Uuid {
        self.0.id
    }
}

/// Access-check middleware: token from the `access_token` cookie or the
/// `Authorization: Bearer` header; 401 on anything short of a valid token
/// referencing an existing user.
pub async fn access_auth(
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_access_token(&jar, request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing access token"))?;

    let claims = auth::verify_token(&token, TokenUse::Access)?;

    let pool = db::pool().await?;
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid access token"))?;

    request
        .extensions_mut()
        .insert(CurrentUser(UserPublic::from(user)));

    Ok(next.run(request).await)
}

fn extract_access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get("access_token") {
        let value = cookie.value();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    bearer_token(headers)
}

/// Extract a token from the `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes_and_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);

        let empty = HeaderMap::new();
        assert_eq!(bearer_token(&empty), None);
    }

    #[test]
    fn cookie_takes_precedence_over_header() {
        let jar = CookieJar::new().add(axum_extra::extract::cookie::Cookie::new(
            "access_token",
            "from-cookie",
        ));
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer from-header"));
        assert_eq!(
            extract_access_token(&jar, &headers).as_deref(),
            Some("from-cookie")
        );
    }
}
