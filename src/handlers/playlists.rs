use axum::{
    extract::{Extension, Path},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::{ensure_owner, parse_id, require_field};
use crate::db;
use crate::error::ApiError;
use crate::middleware::auth::{access_auth, CurrentUser};
use crate::models::Playlist;

pub fn routes() -> Router {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/:userId", get(user_playlists))
        .route(
            "/:playlistId",
            get(get_playlist).patch(update_playlist).delete(delete_playlist),
        )
        .route("/add/:videoId/:playlistId", patch(add_video))
        .route("/remove/:videoId/:playlistId", patch(remove_video))
        .route_layer(middleware::from_fn(access_auth))
}

/// Remove the first occurrence of `target` from the video list.
/// Returns false when the video is not in the list.
fn remove_first(video_ids: &mut Vec<Uuid>, target: Uuid) -> bool {
    match video_ids.iter().position(|id| *id == target) {
        Some(index) => {
            video_ids.remove(index);
            true
        }
        None => false,
    }
}

async fn load_owned_playlist(
    pool: &sqlx::PgPool,
    playlist_id: Uuid,
    caller_id: Uuid,
) -> Result<Playlist, ApiError> {
    let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = $1")
        .bind(playlist_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;

    ensure_owner(playlist.owner_id, caller_id, "playlist")?;
    Ok(playlist)
}

#[derive(Debug, Deserialize)]
struct CreatePlaylistBody {
    name: String,
    #[serde(default)]
    description: String,
}

async fn create_playlist(
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreatePlaylistBody>,
) -> ApiResult<Playlist> {
    let name = require_field(&body.name, "name")?.to_string();

    let pool = db::pool().await?;
    let playlist = sqlx::query_as::<_, Playlist>(
        r#"
        INSERT INTO playlists (id, owner_id, name, description)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(current.id())
    .bind(&name)
    .bind(body.description.trim())
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(
        playlist,
        "Playlist created successfully",
    ))
}

async fn user_playlists(Path(user_id): Path<String>) -> ApiResult<Vec<Playlist>> {
    let user_id = parse_id(&user_id, "user")?;

    let pool = db::pool().await?;
    let playlists = sqlx::query_as::<_, Playlist>(
        "SELECT * FROM playlists WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(
        playlists,
        "User playlists fetched successfully",
    ))
}

async fn get_playlist(
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
) -> ApiResult<Playlist> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let pool = db::pool().await?;
    // Reads are owner-gated too
    let playlist = load_owned_playlist(&pool, playlist_id, current.id()).await?;

    Ok(ApiResponse::success(
        playlist,
        "Playlist fetched successfully",
    ))
}

#[derive(Debug, Deserialize)]
struct UpdatePlaylistBody {
    name: Option<String>,
    description: Option<String>,
}

async fn update_playlist(
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
    Json(body): Json<UpdatePlaylistBody>,
) -> ApiResult<Playlist> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let pool = db::pool().await?;
    let playlist = load_owned_playlist(&pool, playlist_id, current.id()).await?;

    let name = match &body.name {
        Some(name) => require_field(name, "name")?.to_string(),
        None => playlist.name.clone(),
    };
    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .map(str::to_string)
        .unwrap_or_else(|| playlist.description.clone());

    let updated = sqlx::query_as::<_, Playlist>(
        r#"
        UPDATE playlists SET name = $1, description = $2, updated_at = now()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&description)
    .bind(playlist_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(
        updated,
        "Playlist updated successfully",
    ))
}

async fn delete_playlist(
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
) -> ApiResult<Value> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let pool = db::pool().await?;
    load_owned_playlist(&pool, playlist_id, current.id()).await?;

    sqlx::query("DELETE FROM playlists WHERE id = $1")
        .bind(playlist_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::success(
        json!(null),
        "Playlist deleted successfully",
    ))
}

async fn add_video(
    Extension(current): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<Playlist> {
    let video_id = parse_id(&video_id, "video")?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let pool = db::pool().await?;
    let mut playlist = load_owned_playlist(&pool, playlist_id, current.id()).await?;

    // Duplicates are permitted; no membership check on add
    playlist.video_ids.push(video_id);

    let updated = sqlx::query_as::<_, Playlist>(
        r#"
        UPDATE playlists SET video_ids = $1, updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(&playlist.video_ids)
    .bind(playlist_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(
        updated,
        "Video added to playlist successfully",
    ))
}

async fn remove_video(
    Extension(current): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<Playlist> {
    let video_id = parse_id(&video_id, "video")?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let pool = db::pool().await?;
    let mut playlist = load_owned_playlist(&pool, playlist_id, current.id()).await?;

    if !remove_first(&mut playlist.video_ids, video_id) {
        return Err(ApiError::not_found("Video not found in playlist"));
    }

    let updated = sqlx::query_as::<_, Playlist>(
        r#"
        UPDATE playlists SET video_ids = $1, updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(&playlist.video_ids)
    .bind(playlist_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(
        updated,
        "Video removed from playlist successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_two_remove_first_leaves_second() {
        let (v1, v2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut videos: Vec<Uuid> = vec![];

        videos.push(v1);
        videos.push(v2);
        assert!(remove_first(&mut videos, v1));

        assert_eq!(videos, vec![v2]);
    }

    #[test]
    fn remove_missing_video_reports_absent() {
        let mut videos = vec![Uuid::new_v4()];
        assert!(!remove_first(&mut videos, Uuid::new_v4()));
        assert_eq!(videos.len(), 1);
    }

    #[test]
    fn remove_takes_only_first_duplicate() {
        let v = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut videos = vec![v, other, v];
        assert!(remove_first(&mut videos, v));
        assert_eq!(videos, vec![other, v]);
    }
}
