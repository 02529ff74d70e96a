use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub refresh_token: Option<String>,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection: never exposes the password hash or refresh token
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPublic {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_projection_drops_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            full_name: "Alice".into(),
            password_hash: "$argon2id$...".into(),
            avatar_url: None,
            cover_image_url: None,
            refresh_token: Some("token".into()),
            watch_history: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let public = UserPublic::from(user);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token").is_none());
        assert_eq!(json["username"], "alice");
    }
}
