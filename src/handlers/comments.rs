use axum::{
    extract::{Extension, Path, Query},
    middleware,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::{ensure_owner, parse_id, require_field, PageQuery};
use crate::db;
use crate::error::ApiError;
use crate::middleware::auth::{access_auth, CurrentUser};
use crate::models::Comment;

pub fn routes() -> Router {
    Router::new()
        .route("/:videoId", get(list_comments).post(add_comment))
        .route(
            "/c/:commentId",
            axum::routing::patch(update_comment).delete(delete_comment),
        )
        .route_layer(middleware::from_fn(access_auth))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    content: String,
    created_at: chrono::DateTime<chrono::Utc>,
    owner_id: Uuid,
    owner_username: String,
    owner_avatar_url: Option<String>,
    like_count: i64,
}

async fn list_comments(
    Path(video_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<CommentRow>> {
    let video_id = parse_id(&video_id, "video")?;
    let (limit, offset) = page.limit_offset();

    let pool = db::pool().await?;

    let video_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&pool)
        .await?;
    if video_exists.is_none() {
        return Err(ApiError::not_found("Video not found"));
    }

    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c.id, c.content, c.created_at,
               u.id AS owner_id, u.username AS owner_username, u.avatar_url AS owner_avatar_url,
               COUNT(l.id) AS like_count
        FROM comments c
        JOIN users u ON u.id = c.owner_id
        LEFT JOIN likes l ON l.comment_id = c.id
        WHERE c.video_id = $1
        GROUP BY c.id, u.id
        ORDER BY c.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(video_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(rows, "Comments fetched successfully"))
}

#[derive(Debug, Deserialize)]
struct CommentBody {
    content: String,
}

async fn add_comment(
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> ApiResult<Comment> {
    let video_id = parse_id(&video_id, "video")?;
    let content = require_field(&body.content, "content")?.to_string();

    let pool = db::pool().await?;

    let video_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&pool)
        .await?;
    if video_exists.is_none() {
        return Err(ApiError::not_found("Video not found"));
    }

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (id, video_id, owner_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(video_id)
    .bind(current.id())
    .bind(&content)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

async fn update_comment(
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> ApiResult<Comment> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let content = require_field(&body.content, "content")?.to_string();

    let pool = db::pool().await?;
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    ensure_owner(comment.owner_id, current.id(), "comment")?;

    let updated = sqlx::query_as::<_, Comment>(
        r#"
        UPDATE comments SET content = $1, updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(&content)
    .bind(comment_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(updated, "Comment updated successfully"))
}

async fn delete_comment(
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> ApiResult<Value> {
    let comment_id = parse_id(&comment_id, "comment")?;

    let pool = db::pool().await?;
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    ensure_owner(comment.owner_id, current.id(), "comment")?;

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::success(
        json!(null),
        "Comment deleted successfully",
    ))
}
