use axum::{
    extract::{Extension, Path},
    middleware,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::parse_id;
use crate::db;
use crate::error::ApiError;
use crate::middleware::auth::{access_auth, CurrentUser};
use crate::models::LikeTarget;

pub fn routes() -> Router {
    Router::new()
        .route("/toggle/v/:videoId", post(toggle_video_like))
        .route("/toggle/c/:commentId", post(toggle_comment_like))
        .route("/toggle/t/:tweetId", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
        .route_layer(middleware::from_fn(access_auth))
}

/// Toggle the like row for (caller, target) and report the resulting state.
///
/// Delete-first keeps the toggle atomic per step: zero rows deleted means the
/// like was absent, and the insert relies on the unique pair index (`ON
/// CONFLICT DO NOTHING`) so concurrent duplicate requests cannot produce two
/// rows.
async fn toggle_like(target: LikeTarget, liker: Uuid) -> Result<bool, ApiError> {
    let pool = db::pool().await?;

    let exists: Option<(Uuid,)> =
        sqlx::query_as(&format!("SELECT id FROM {} WHERE id = $1", target.table()))
            .bind(target.id())
            .fetch_optional(&pool)
            .await?;
    if exists.is_none() {
        return Err(ApiError::not_found(format!(
            "{} not found",
            capitalize(target.kind())
        )));
    }

    let deleted = sqlx::query(&format!(
        "DELETE FROM likes WHERE liked_by = $1 AND {} = $2",
        target.column()
    ))
    .bind(liker)
    .bind(target.id())
    .execute(&pool)
    .await?
    .rows_affected();

    if !toggled_state(deleted) {
        return Ok(false);
    }

    sqlx::query(&format!(
        "INSERT INTO likes (id, liked_by, {}) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        target.column()
    ))
    .bind(Uuid::new_v4())
    .bind(liker)
    .bind(target.id())
    .execute(&pool)
    .await?;

    Ok(true)
}

/// Zero rows deleted means the like was absent, so the toggle lands liked
fn toggled_state(deleted_rows: u64) -> bool {
    deleted_rows == 0
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

async fn toggle_video_like(
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> ApiResult<Value> {
    let target = LikeTarget::Video(parse_id(&video_id, "video")?);
    let is_liked = toggle_like(target, current.id()).await?;
    Ok(ApiResponse::success(
        json!({ "is_liked": is_liked, "type": target.kind() }),
        "Video like toggled successfully",
    ))
}

async fn toggle_comment_like(
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> ApiResult<Value> {
    let target = LikeTarget::Comment(parse_id(&comment_id, "comment")?);
    let is_liked = toggle_like(target, current.id()).await?;
    Ok(ApiResponse::success(
        json!({ "is_liked": is_liked, "type": target.kind() }),
        "Comment like toggled successfully",
    ))
}

async fn toggle_tweet_like(
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> ApiResult<Value> {
    let target = LikeTarget::Tweet(parse_id(&tweet_id, "tweet")?);
    let is_liked = toggle_like(target, current.id()).await?;
    Ok(ApiResponse::success(
        json!({ "is_liked": is_liked, "type": target.kind() }),
        "Tweet like toggled successfully",
    ))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct LikedVideoRow {
    id: Uuid,
    title: String,
    thumbnail_url: String,
    video_url: String,
    duration_secs: f64,
    views: i64,
    owner_id: Uuid,
    owner_username: String,
    owner_avatar_url: Option<String>,
    liked_at: chrono::DateTime<chrono::Utc>,
}

async fn liked_videos(Extension(current): Extension<CurrentUser>) -> ApiResult<Vec<LikedVideoRow>> {
    let pool = db::pool().await?;

    let rows = sqlx::query_as::<_, LikedVideoRow>(
        r#"
        SELECT v.id, v.title, v.thumbnail_url, v.video_url, v.duration_secs, v.views,
               u.id AS owner_id, u.username AS owner_username, u.avatar_url AS owner_avatar_url,
               l.created_at AS liked_at
        FROM likes l
        JOIN videos v ON v.id = l.video_id
        JOIN users u ON u.id = v.owner_id
        WHERE l.liked_by = $1 AND l.video_id IS NOT NULL
        ORDER BY l.created_at DESC
        "#,
    )
    .bind(current.id())
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(
        rows,
        "Liked videos fetched successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_kind_names() {
        assert_eq!(capitalize("video"), "Video");
        assert_eq!(capitalize("comment"), "Comment");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn toggle_alternates_like_state() {
        let mut liked = false;
        for expected in [true, false, true] {
            // A standing like is the row the delete step removes
            let deleted = u64::from(liked);
            liked = toggled_state(deleted);
            assert_eq!(liked, expected);
        }
    }

    #[test]
    fn toggle_targets_use_distinct_columns() {
        let id = Uuid::new_v4();
        assert_eq!(LikeTarget::Video(id).column(), "video_id");
        assert_eq!(LikeTarget::Comment(id).column(), "comment_id");
        assert_eq!(LikeTarget::Tweet(id).column(), "tweet_id");
    }
}
