use axum::{
    extract::{Extension, Path},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::{ensure_owner, parse_id, require_field};
use crate::db;
use crate::error::ApiError;
use crate::middleware::auth::{access_auth, CurrentUser};
use crate::models::Tweet;

pub fn routes() -> Router {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/:userId", get(user_tweets))
        .route("/:tweetId", patch(update_tweet).delete(delete_tweet))
        .route_layer(middleware::from_fn(access_auth))
}

#[derive(Debug, Deserialize)]
struct TweetBody {
    content: String,
}

async fn create_tweet(
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<TweetBody>,
) -> ApiResult<Tweet> {
    let content = require_field(&body.content, "content")?.to_string();

    let pool = db::pool().await?;
    let tweet = sqlx::query_as::<_, Tweet>(
        r#"
        INSERT INTO tweets (id, owner_id, content)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(current.id())
    .bind(&content)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

async fn user_tweets(Path(user_id): Path<String>) -> ApiResult<Vec<Tweet>> {
    let user_id = parse_id(&user_id, "user")?;

    let pool = db::pool().await?;
    let tweets = sqlx::query_as::<_, Tweet>(
        "SELECT * FROM tweets WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(tweets, "Tweets fetched successfully"))
}

async fn update_tweet(
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
    Json(body): Json<TweetBody>,
) -> ApiResult<Tweet> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let content = require_field(&body.content, "content")?.to_string();

    let pool = db::pool().await?;
    let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = $1")
        .bind(tweet_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;

    ensure_owner(tweet.owner_id, current.id(), "tweet")?;

    let updated = sqlx::query_as::<_, Tweet>(
        r#"
        UPDATE tweets SET content = $1, updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(&content)
    .bind(tweet_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(updated, "Tweet updated successfully"))
}

async fn delete_tweet(
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> ApiResult<Value> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;

    let pool = db::pool().await?;
    let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = $1")
        .bind(tweet_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;

    ensure_owner(tweet.owner_id, current.id(), "tweet")?;

    sqlx::query("DELETE FROM tweets WHERE id = $1")
        .bind(tweet_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::success(
        serde_json::json!(null),
        "Tweet deleted successfully",
    ))
}
