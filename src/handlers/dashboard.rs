use axum::{extract::Extension, middleware, routing::get, Router};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::db;
use crate::middleware::auth::{access_auth, CurrentUser};

pub fn routes() -> Router {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(channel_videos))
        .route_layer(middleware::from_fn(access_auth))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct VideoStatRow {
    id: Uuid,
    title: String,
    thumbnail_url: String,
    video_url: String,
    duration_secs: f64,
    views: i64,
    is_published: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    like_count: i64,
}

#[derive(Debug, Default, PartialEq, Serialize)]
struct ChannelTotals {
    total_videos: i64,
    total_views: i64,
    total_likes: i64,
}

/// Reduce per-video rows to channel totals.
/// The per-item like counts come from the join; the summing happens here.
fn reduce_totals(rows: &[VideoStatRow]) -> ChannelTotals {
    rows.iter().fold(ChannelTotals::default(), |acc, row| ChannelTotals {
        total_videos: acc.total_videos + 1,
        total_views: acc.total_views + row.views,
        total_likes: acc.total_likes + row.like_count,
    })
}

async fn owned_video_rows(owner_id: Uuid) -> Result<Vec<VideoStatRow>, crate::error::ApiError> {
    let pool = db::pool().await?;

    let rows = sqlx::query_as::<_, VideoStatRow>(
        r#"
        SELECT v.id, v.title, v.thumbnail_url, v.video_url, v.duration_secs,
               v.views, v.is_published, v.created_at,
               COUNT(l.id) AS like_count
        FROM videos v
        LEFT JOIN likes l ON l.video_id = v.id
        WHERE v.owner_id = $1
        GROUP BY v.id
        ORDER BY v.created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(&pool)
    .await?;

    Ok(rows)
}

async fn channel_stats(Extension(current): Extension<CurrentUser>) -> ApiResult<Value> {
    let rows = owned_video_rows(current.id()).await?;
    let totals = reduce_totals(&rows);

    let pool = db::pool().await?;
    let subscriber_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1")
            .bind(current.id())
            .fetch_one(&pool)
            .await?;

    Ok(ApiResponse::success(
        json!({
            "subscriber_count": subscriber_count,
            "total_videos": totals.total_videos,
            "total_views": totals.total_views,
            "total_likes": totals.total_likes,
        }),
        "Channel stats fetched successfully",
    ))
}

async fn channel_videos(Extension(current): Extension<CurrentUser>) -> ApiResult<Vec<VideoStatRow>> {
    let rows = owned_video_rows(current.id()).await?;
    Ok(ApiResponse::success(
        rows,
        "Channel videos fetched successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(views: i64, like_count: i64) -> VideoStatRow {
        VideoStatRow {
            id: Uuid::new_v4(),
            title: "t".into(),
            thumbnail_url: "https://cdn/t.png".into(),
            video_url: "https://cdn/v.mp4".into(),
            duration_secs: 1.0,
            views,
            is_published: true,
            created_at: chrono::Utc::now(),
            like_count,
        }
    }

    #[test]
    fn totals_sum_per_video_counts() {
        // N videos with L like rows spread across them
        let rows = vec![row(10, 3), row(5, 0), row(0, 7)];
        let totals = reduce_totals(&rows);
        assert_eq!(totals.total_videos, 3);
        assert_eq!(totals.total_views, 15);
        assert_eq!(totals.total_likes, 10);
    }

    #[test]
    fn empty_channel_reduces_to_zero() {
        assert_eq!(reduce_totals(&[]), ChannelTotals::default());
    }
}
