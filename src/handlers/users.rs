use axum::{
    extract::{Extension, Path},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::require_field;
use crate::auth::{self, password, TokenUse};
use crate::config;
use crate::db;
use crate::error::ApiError;
use crate::middleware::auth::{access_auth, CurrentUser};
use crate::models::{User, UserPublic};
use crate::services::media;

pub fn routes() -> Router {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/c/:username", get(channel_profile))
        .route("/history", get(watch_history))
        .route_layer(middleware::from_fn(access_auth));

    public.merge(protected)
}

fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(config::config().security.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Mint an access+refresh pair and persist the refresh token on the user
/// record, invalidating whatever token was stored before (single active
/// refresh token per user).
async fn issue_token_pair(user_id: Uuid, username: &str) -> Result<(String, String), ApiError> {
    let access_token = auth::mint_access_token(user_id, username)?;
    let refresh_token = auth::mint_refresh_token(user_id, username)?;

    let pool = db::pool().await?;
    sqlx::query("UPDATE users SET refresh_token = $1, updated_at = now() WHERE id = $2")
        .bind(&refresh_token)
        .bind(user_id)
        .execute(&pool)
        .await?;

    Ok((access_token, refresh_token))
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
    full_name: String,
    avatar_path: Option<String>,
    cover_image_path: Option<String>,
}

async fn register(Json(body): Json<RegisterBody>) -> ApiResult<UserPublic> {
    let username = require_field(&body.username, "username")?.to_lowercase();
    let email = require_field(&body.email, "email")?.to_string();
    let password = require_field(&body.password, "password")?;
    let full_name = require_field(&body.full_name, "full_name")?.to_string();
    let avatar_path = require_field(body.avatar_path.as_deref().unwrap_or_default(), "avatar_path")?;

    let pool = db::pool().await?;

    let taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE username = $1 OR email = $2")
            .bind(&username)
            .bind(&email)
            .fetch_optional(&pool)
            .await?;
    if taken.is_some() {
        return Err(ApiError::conflict(
            "User with this email or username already exists",
        ));
    }

    let avatar_url = media::client().upload(avatar_path, "avatars").await?.url;
    let cover_image_url = match &body.cover_image_path {
        Some(path) => Some(media::client().upload(path, "covers").await?.url),
        None => None,
    };

    let password_hash = password::hash_password(password)
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, full_name, password_hash, avatar_url, cover_image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&username)
    .bind(&email)
    .bind(&full_name)
    .bind(&password_hash)
    .bind(&avatar_url)
    .bind(&cover_image_url)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(
        UserPublic::from(user),
        "User registered successfully",
    ))
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    username: Option<String>,
    email: Option<String>,
    password: String,
}

// Usernames are stored lowercased; emails keep their stored case
const LOGIN_LOOKUP_SQL: &str = "SELECT * FROM users WHERE username = lower($1) OR email = $1";

async fn login(
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    let identifier = body
        .username
        .as_deref()
        .or(body.email.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("username or email is required"))?;

    let pool = db::pool().await?;
    let user = sqlx::query_as::<_, User>(LOGIN_LOOKUP_SQL)
        .bind(identifier)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid user credentials"))?;

    password::verify_password(&body.password, &user.password_hash)
        .map_err(|_| ApiError::unauthorized("Invalid user credentials"))?;

    let (access_token, refresh_token) = issue_token_pair(user.id, &user.username).await?;

    let jar = jar
        .add(auth_cookie("access_token", access_token.clone()))
        .add(auth_cookie("refresh_token", refresh_token.clone()));

    Ok((
        jar,
        ApiResponse::success(
            json!({
                "user": UserPublic::from(user),
                "access_token": access_token,
                "refresh_token": refresh_token,
            }),
            "User logged in successfully",
        ),
    ))
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
    refresh_token: Option<String>,
}

/// A presented refresh token is valid only while it exactly matches the
/// single token stored on the user record; rotation leaves stale copies
/// behind, and logout clears the stored token entirely.
fn refresh_token_is_current(stored: Option<&str>, presented: &str) -> bool {
    stored == Some(presented)
}

async fn refresh_token(
    jar: CookieJar,
    body: Option<Json<RefreshBody>>,
) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    let presented = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing refresh token"))?;

    let claims = auth::verify_token(&presented, TokenUse::Refresh)?;

    let pool = db::pool().await?;
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    if !refresh_token_is_current(user.refresh_token.as_deref(), &presented) {
        return Err(ApiError::unauthorized(
            "Refresh token is expired or already used",
        ));
    }

    let (access_token, new_refresh_token) = issue_token_pair(user.id, &user.username).await?;

    let jar = jar
        .add(auth_cookie("access_token", access_token.clone()))
        .add(auth_cookie("refresh_token", new_refresh_token.clone()));

    Ok((
        jar,
        ApiResponse::success(
            json!({
                "access_token": access_token,
                "refresh_token": new_refresh_token,
            }),
            "Access token refreshed",
        ),
    ))
}

async fn logout(
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    let pool = db::pool().await?;
    sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = now() WHERE id = $1")
        .bind(current.id())
        .execute(&pool)
        .await?;

    let jar = jar
        .remove(removal_cookie("access_token"))
        .remove(removal_cookie("refresh_token"));

    Ok((
        jar,
        ApiResponse::success(json!({}), "User logged out successfully"),
    ))
}

async fn current_user(Extension(current): Extension<CurrentUser>) -> ApiResult<UserPublic> {
    Ok(ApiResponse::success(
        current.0,
        "Current user fetched successfully",
    ))
}

#[derive(Debug, Deserialize)]
struct UpdateAccountBody {
    full_name: String,
    email: String,
}

async fn update_account(
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateAccountBody>,
) -> ApiResult<UserPublic> {
    let full_name = require_field(&body.full_name, "full_name")?.to_string();
    let email = require_field(&body.email, "email")?.to_string();

    let pool = db::pool().await?;
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET full_name = $1, email = $2, updated_at = now()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(&full_name)
    .bind(&email)
    .bind(current.id())
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiError::from_sqlx_with_conflict(e, "Email is already in use"))?;

    Ok(ApiResponse::success(
        UserPublic::from(user),
        "Account details updated successfully",
    ))
}

async fn channel_profile(
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> ApiResult<Value> {
    let username = require_field(&username, "username")?.to_lowercase();

    let pool = db::pool().await?;
    let channel = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Channel does not exist"))?;

    let subscriber_ids: Vec<Uuid> =
        sqlx::query_scalar("SELECT subscriber_id FROM subscriptions WHERE channel_id = $1")
            .bind(channel.id)
            .fetch_all(&pool)
            .await?;

    let subscribed_to_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = $1")
            .bind(channel.id)
            .fetch_one(&pool)
            .await?;

    // Caller-id membership in the joined subscriber set
    let is_subscribed = subscriber_ids.contains(&current.id());

    let profile = UserPublic::from(channel);
    Ok(ApiResponse::success(
        json!({
            "id": profile.id,
            "username": profile.username,
            "full_name": profile.full_name,
            "avatar_url": profile.avatar_url,
            "cover_image_url": profile.cover_image_url,
            "subscriber_count": subscriber_ids.len(),
            "subscribed_to_count": subscribed_to_count,
            "is_subscribed": is_subscribed,
        }),
        "Channel profile fetched successfully",
    ))
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
struct WatchVideoRow {
    id: Uuid,
    title: String,
    video_url: String,
    thumbnail_url: String,
    duration_secs: f64,
    views: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    owner_id: Uuid,
    owner_username: String,
    owner_avatar_url: Option<String>,
}

/// Project the fetched rows back into watch-history order
fn order_by_history(history: &[Uuid], rows: Vec<WatchVideoRow>) -> Vec<WatchVideoRow> {
    let mut by_id: std::collections::HashMap<Uuid, WatchVideoRow> =
        rows.into_iter().map(|row| (row.id, row)).collect();
    history.iter().filter_map(|id| by_id.remove(id)).collect()
}

async fn watch_history(Extension(current): Extension<CurrentUser>) -> ApiResult<Vec<WatchVideoRow>> {
    let pool = db::pool().await?;

    let history: Vec<Uuid> = sqlx::query_scalar("SELECT watch_history FROM users WHERE id = $1")
        .bind(current.id())
        .fetch_one(&pool)
        .await?;

    if history.is_empty() {
        return Ok(ApiResponse::success(
            vec![],
            "Watch history fetched successfully",
        ));
    }

    let rows = sqlx::query_as::<_, WatchVideoRow>(
        r#"
        SELECT v.id, v.title, v.video_url, v.thumbnail_url, v.duration_secs, v.views, v.created_at,
               u.id AS owner_id, u.username AS owner_username, u.avatar_url AS owner_avatar_url
        FROM videos v
        JOIN users u ON u.id = v.owner_id
        WHERE v.id = ANY($1)
        "#,
    )
    .bind(&history)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(
        order_by_history(&history, rows),
        "Watch history fetched successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Uuid, title: &str) -> WatchVideoRow {
        WatchVideoRow {
            id,
            title: title.to_string(),
            video_url: "https://cdn/v.mp4".into(),
            thumbnail_url: "https://cdn/t.png".into(),
            duration_secs: 10.0,
            views: 0,
            created_at: chrono::Utc::now(),
            owner_id: Uuid::new_v4(),
            owner_username: "owner".into(),
            owner_avatar_url: None,
        }
    }

    #[test]
    fn watch_history_order_is_preserved() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let history = vec![c, a, b];
        // Fetch order differs from history order
        let rows = vec![row(a, "a"), row(b, "b"), row(c, "c")];

        let ordered = order_by_history(&history, rows);
        let titles: Vec<&str> = ordered.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["c", "a", "b"]);
    }

    #[test]
    fn deleted_videos_drop_out_of_history() {
        let (a, gone) = (Uuid::new_v4(), Uuid::new_v4());
        let history = vec![gone, a];
        let ordered = order_by_history(&history, vec![row(a, "a")]);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].id, a);
    }

    #[test]
    fn auth_cookies_are_http_only() {
        let cookie = auth_cookie("access_token", "tok".into());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn login_lookup_lowercases_only_the_username() {
        assert!(LOGIN_LOOKUP_SQL.contains("username = lower($1)"));
        assert!(LOGIN_LOOKUP_SQL.contains("email = $1"));
        assert!(!LOGIN_LOOKUP_SQL.contains("lower(email"));
    }

    #[test]
    fn superseded_refresh_token_is_rejected() {
        // Rotation stored a newer token; the stale copy no longer matches
        assert!(!refresh_token_is_current(Some("rotated-in"), "rotated-out"));
        assert!(refresh_token_is_current(Some("current"), "current"));
        // Logged-out users store no token at all
        assert!(!refresh_token_is_current(None, "anything"));
    }
}
