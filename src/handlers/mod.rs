pub mod comments;
pub mod dashboard;
pub mod healthcheck;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;
