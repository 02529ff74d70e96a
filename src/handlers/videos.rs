use axum::{
    extract::{Extension, Path, Query},
    middleware,
    routing::{get, patch},
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
use crate::models::Video;
use crate::services::media;

pub fn routes() -> Router {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route(
            "/:videoId",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/toggle/publish/:videoId", patch(toggle_publish))
        .route_layer(middleware::from_fn(access_auth))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    query: Option<String>,
    sort_by: Option<String>,
    sort_type: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

/// Whitelisted sort column and direction; anything else falls back to
/// newest-first.
fn sort_clause(sort_by: Option<&str>, sort_type: Option<&str>) -> (&'static str, &'static str) {
    let column = match sort_by {
        Some("views") => "views",
        Some("duration") => "duration_secs",
        Some("title") => "title",
        _ => "created_at",
    };
    let direction = match sort_type {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    (column, direction)
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct VideoListRow {
    id: Uuid,
    title: String,
    description: String,
    video_url: String,
    thumbnail_url: String,
    duration_secs: f64,
    views: i64,
    is_published: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    owner_id: Uuid,
    owner_username: String,
    owner_avatar_url: Option<String>,
    like_count: i64,
}

async fn list_videos(Query(query): Query<ListQuery>) -> ApiResult<Vec<VideoListRow>> {
    if let Some(q) = &query.query {
        if q.trim().is_empty() {
            return Err(ApiError::bad_request("query cannot be empty"));
        }
    }

    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (limit, offset) = page.limit_offset();
    let (column, direction) = sort_clause(query.sort_by.as_deref(), query.sort_type.as_deref());

    let pool = db::pool().await?;
    let sql = format!(
        r#"
        SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url, v.duration_secs,
               v.views, v.is_published, v.created_at,
               u.id AS owner_id, u.username AS owner_username, u.avatar_url AS owner_avatar_url,
               COUNT(l.id) AS like_count
        FROM videos v
        JOIN users u ON u.id = v.owner_id
        LEFT JOIN likes l ON l.video_id = v.id
        WHERE v.is_published
          AND ($1::text IS NULL OR v.title ILIKE '%' || $1 || '%' OR v.description ILIKE '%' || $1 || '%')
        GROUP BY v.id, u.id
        ORDER BY v.{} {}
        LIMIT $2 OFFSET $3
        "#,
        column, direction
    );

    let rows = sqlx::query_as::<_, VideoListRow>(&sql)
        .bind(query.query.as_deref().map(str::trim))
        .bind(limit)
        .bind(offset)
        .fetch_all(&pool)
        .await?;

    Ok(ApiResponse::success(rows, "Videos fetched successfully"))
}

#[derive(Debug, Deserialize)]
struct PublishBody {
    title: String,
    description: String,
    video_file_path: String,
    thumbnail_path: String,
}

async fn publish_video(
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<PublishBody>,
) -> ApiResult<Video> {
    let title = require_field(&body.title, "title")?.to_string();
    let description = require_field(&body.description, "description")?.to_string();
    require_field(&body.video_file_path, "video_file_path")?;
    require_field(&body.thumbnail_path, "thumbnail_path")?;

    let video_file = media::client().upload(&body.video_file_path, "videos").await?;
    let thumbnail = media::client().upload(&body.thumbnail_path, "thumbnails").await?;

    let pool = db::pool().await?;
    let video = sqlx::query_as::<_, Video>(
        r#"
        INSERT INTO videos (id, owner_id, video_url, thumbnail_url, title, description, duration_secs)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(current.id())
    .bind(&video_file.url)
    .bind(&thumbnail.url)
    .bind(&title)
    .bind(&description)
    .bind(video_file.duration.unwrap_or(0.0))
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(video, "Video uploaded successfully"))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct VideoDetailRow {
    id: Uuid,
    title: String,
    description: String,
    video_url: String,
    thumbnail_url: String,
    duration_secs: f64,
    views: i64,
    is_published: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    owner_id: Uuid,
    owner_username: String,
    owner_avatar_url: Option<String>,
    like_count: i64,
}

async fn get_video(
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> ApiResult<VideoDetailRow> {
    let video_id = parse_id(&video_id, "video")?;
    let pool = db::pool().await?;

    let video = sqlx::query_as::<_, VideoDetailRow>(
        r#"
        SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url, v.duration_secs,
               v.views, v.is_published, v.created_at,
               u.id AS owner_id, u.username AS owner_username, u.avatar_url AS owner_avatar_url,
               COUNT(l.id) AS like_count
        FROM videos v
        JOIN users u ON u.id = v.owner_id
        LEFT JOIN likes l ON l.video_id = v.id
        WHERE v.id = $1
        GROUP BY v.id, u.id
        "#,
    )
    .bind(video_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Video not found"))?;

    // A fetch counts as a view and moves the video to the back of the
    // caller's watch history (first occurrence removed, then appended).
    sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
        .bind(video_id)
        .execute(&pool)
        .await?;

    sqlx::query(
        r#"
        UPDATE users
        SET watch_history = array_append(array_remove(watch_history, $1), $1)
        WHERE id = $2
        "#,
    )
    .bind(video_id)
    .bind(current.id())
    .execute(&pool)
    .await?;

    Ok(ApiResponse::success(video, "Video fetched successfully"))
}

#[derive(Debug, Deserialize)]
struct UpdateVideoBody {
    title: String,
    description: String,
    thumbnail_path: Option<String>,
}

async fn update_video(
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Json(body): Json<UpdateVideoBody>,
) -> ApiResult<Video> {
    let video_id = parse_id(&video_id, "video")?;
    let title = require_field(&body.title, "title")?.to_string();
    let description = require_field(&body.description, "description")?.to_string();

    let pool = db::pool().await?;
    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    ensure_owner(video.owner_id, current.id(), "video")?;

    let thumbnail_url = match &body.thumbnail_path {
        Some(path) => media::client().upload(path, "thumbnails").await?.url,
        None => video.thumbnail_url.clone(),
    };

    let updated = sqlx::query_as::<_, Video>(
        r#"
        UPDATE videos
        SET title = $1, description = $2, thumbnail_url = $3, updated_at = now()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(&description)
    .bind(&thumbnail_url)
    .bind(video_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(updated, "Video updated successfully"))
}

async fn delete_video(
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> ApiResult<Value> {
    let video_id = parse_id(&video_id, "video")?;

    let pool = db::pool().await?;
    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    ensure_owner(video.owner_id, current.id(), "video")?;

    // Likes and comments go with it via ON DELETE CASCADE
    sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(video_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::success(
        json!({}),
        "Video deleted successfully",
    ))
}

async fn toggle_publish(
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> ApiResult<Video> {
    let video_id = parse_id(&video_id, "video")?;

    let pool = db::pool().await?;
    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    ensure_owner(video.owner_id, current.id(), "video")?;

    let updated = sqlx::query_as::<_, Video>(
        r#"
        UPDATE videos SET is_published = NOT is_published, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(video_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(
        updated,
        "Publish status toggled successfully",
    ))
}
