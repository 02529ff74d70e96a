use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The like target as the domain sees it: a tagged variant, so
/// "exactly one target set" holds at the type level. The storage side
/// mirrors this with three nullable columns and a CHECK constraint
/// keeping exactly one of them set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl LikeTarget {
    /// Table the target row lives in
    pub fn table(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "videos",
            LikeTarget::Comment(_) => "comments",
            LikeTarget::Tweet(_) => "tweets",
        }
    }

    /// Column on `likes` referencing this target kind
    pub fn column(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video_id",
            LikeTarget::Comment(_) => "comment_id",
            LikeTarget::Tweet(_) => "tweet_id",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Tweet(_) => "tweet",
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_maps_to_table_and_column() {
        let id = Uuid::new_v4();
        let target = LikeTarget::Video(id);
        assert_eq!(target.column(), "video_id");
        assert_eq!(target.table(), "videos");
        assert_eq!(target.kind(), "video");
        assert_eq!(target.id(), id);
    }

    #[test]
    fn target_serializes_as_tagged_variant() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(LikeTarget::Comment(id)).unwrap();
        assert_eq!(json["type"], "comment");
        assert_eq!(json["id"], id.to_string());
    }
}
