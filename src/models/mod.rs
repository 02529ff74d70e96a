pub mod comment;
pub mod like;
pub mod playlist;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::Comment;
pub use like::LikeTarget;
pub use playlist::Playlist;
pub use tweet::Tweet;
pub use user::{User, UserPublic};
pub use video::Video;
