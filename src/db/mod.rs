use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Get the process-wide connection pool, creating it lazily on first use
pub async fn pool() -> Result<PgPool, DbError> {
    let pool = POOL
        .get_or_try_init(|| async {
            let url = std::env::var("DATABASE_URL")
                .map_err(|_| DbError::ConfigMissing("DATABASE_URL"))?;

            let db_config = &config::config().database;
            let pool = PgPoolOptions::new()
                .max_connections(db_config.max_connections)
                .acquire_timeout(Duration::from_secs(db_config.connection_timeout_secs))
                .connect(&url)
                .await?;

            info!("Created database pool");
            Ok::<_, DbError>(pool)
        })
        .await?;

    Ok(pool.clone())
}

/// Pings the pool to ensure connectivity
pub async fn health_check() -> Result<(), DbError> {
    let pool = pool().await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(())
}

/// Idempotent schema bootstrap, executed at startup
pub async fn init_schema() -> Result<(), DbError> {
    let pool = pool().await?;

    for ddl in SCHEMA_DDL {
        sqlx::query(ddl).execute(&pool).await?;
    }

    info!("Database schema ready");
    Ok(())
}

const SCHEMA_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id              UUID PRIMARY KEY,
        username        TEXT NOT NULL UNIQUE,
        email           TEXT NOT NULL UNIQUE,
        full_name       TEXT NOT NULL,
        password_hash   TEXT NOT NULL,
        avatar_url      TEXT,
        cover_image_url TEXT,
        refresh_token   TEXT,
        watch_history   UUID[] NOT NULL DEFAULT '{}',
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS videos (
        id            UUID PRIMARY KEY,
        owner_id      UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        video_url     TEXT NOT NULL,
        thumbnail_url TEXT NOT NULL,
        title         TEXT NOT NULL,
        description   TEXT NOT NULL,
        duration_secs DOUBLE PRECISION NOT NULL DEFAULT 0,
        views         BIGINT NOT NULL DEFAULT 0,
        is_published  BOOLEAN NOT NULL DEFAULT TRUE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id         UUID PRIMARY KEY,
        video_id   UUID NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
        owner_id   UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        content    TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tweets (
        id         UUID PRIMARY KEY,
        owner_id   UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        content    TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    // Exactly one like target set, at most one like per (liker, target)
    r#"
    CREATE TABLE IF NOT EXISTS likes (
        id         UUID PRIMARY KEY,
        liked_by   UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        video_id   UUID REFERENCES videos(id) ON DELETE CASCADE,
        comment_id UUID REFERENCES comments(id) ON DELETE CASCADE,
        tweet_id   UUID REFERENCES tweets(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CHECK (num_nonnulls(video_id, comment_id, tweet_id) = 1)
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS likes_liker_video_uniq
        ON likes (liked_by, video_id) WHERE video_id IS NOT NULL
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS likes_liker_comment_uniq
        ON likes (liked_by, comment_id) WHERE comment_id IS NOT NULL
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS likes_liker_tweet_uniq
        ON likes (liked_by, tweet_id) WHERE tweet_id IS NOT NULL
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subscriptions (
        id            UUID PRIMARY KEY,
        subscriber_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        channel_id    UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (subscriber_id, channel_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS playlists (
        id          UUID PRIMARY KEY,
        owner_id    UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name        TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        video_ids   UUID[] NOT NULL DEFAULT '{}',
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_covers_all_collections() {
        let ddl = SCHEMA_DDL.join("\n");
        for table in [
            "users",
            "videos",
            "comments",
            "tweets",
            "likes",
            "subscriptions",
            "playlists",
        ] {
            assert!(
                ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)),
                "missing table {}",
                table
            );
        }
        // Pair-key uniqueness backing the toggle invariants
        assert!(ddl.contains("UNIQUE (subscriber_id, channel_id)"));
        assert!(ddl.contains("likes_liker_video_uniq"));
    }
}
