use axum::{
    extract::{Extension, Path},
    middleware,
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::parse_id;
use crate::api::response::{ApiResponse, ApiResult};
use crate::db;
use crate::error::ApiError;
use crate::middleware::auth::{access_auth, CurrentUser};

pub fn routes() -> Router {
    Router::new()
        .route(
            "/c/:channelId",
            get(channel_subscribers).post(toggle_subscription),
        )
        .route("/u/:subscriberId", get(subscribed_channels))
        .route_layer(middleware::from_fn(access_auth))
}

async fn toggle_subscription(
    Extension(current): Extension<CurrentUser>,
    Path(channel_id): Path<String>,
) -> ApiResult<Value> {
    let channel_id = parse_id(&channel_id, "channel")?;

    if channel_id == current.id() {
        return Err(ApiError::bad_request("You cannot subscribe to yourself"));
    }

    let pool = db::pool().await?;

    let channel_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(channel_id)
        .fetch_optional(&pool)
        .await?;
    if channel_exists.is_none() {
        return Err(ApiError::not_found("Channel not found"));
    }

    // Same atomic delete-first toggle as likes; the unique
    // (subscriber_id, channel_id) pair backs it
    let deleted = sqlx::query(
        "DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2",
    )
    .bind(current.id())
    .bind(channel_id)
    .execute(&pool)
    .await?
    .rows_affected();

    let is_subscribed = if deleted > 0 {
        false
    } else {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, subscriber_id, channel_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(current.id())
        .bind(channel_id)
        .execute(&pool)
        .await?;
        true
    };

    Ok(ApiResponse::success(
        json!({ "is_subscribed": is_subscribed }),
        "Subscription toggled successfully",
    ))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    username: String,
    full_name: String,
    avatar_url: Option<String>,
    subscribed_at: chrono::DateTime<chrono::Utc>,
}

async fn channel_subscribers(Path(channel_id): Path<String>) -> ApiResult<Vec<SubscriberRow>> {
    let channel_id = parse_id(&channel_id, "channel")?;

    let pool = db::pool().await?;
    let subscribers = sqlx::query_as::<_, SubscriberRow>(
        r#"
        SELECT u.id, u.username, u.full_name, u.avatar_url, s.created_at AS subscribed_at
        FROM subscriptions s
        JOIN users u ON u.id = s.subscriber_id
        WHERE s.channel_id = $1
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(channel_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(
        subscribers,
        "Subscribers fetched successfully",
    ))
}

async fn subscribed_channels(Path(subscriber_id): Path<String>) -> ApiResult<Vec<SubscriberRow>> {
    let subscriber_id = parse_id(&subscriber_id, "subscriber")?;

    let pool = db::pool().await?;
    let channels = sqlx::query_as::<_, SubscriberRow>(
        r#"
        SELECT u.id, u.username, u.full_name, u.avatar_url, s.created_at AS subscribed_at
        FROM subscriptions s
        JOIN users u ON u.id = s.channel_id
        WHERE s.subscriber_id = $1
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(subscriber_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(
        channels,
        "Subscribed channels fetched successfully",
    ))
}
