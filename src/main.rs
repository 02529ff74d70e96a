use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use vidtube_api::{db, handlers};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, token secrets, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = vidtube_api::config::config();
    tracing::info!("Starting VidTube API in {:?} mode", config.environment);

    // Schema bootstrap is best-effort: the server still boots without a
    // database and reports it as unreachable on the healthcheck.
    if let Err(e) = db::init_schema().await {
        tracing::warn!("Skipping schema bootstrap: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("VIDTUBE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("VidTube API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .nest("/api/v1/healthcheck", handlers::healthcheck::routes())
        .nest("/api/v1/users", handlers::users::routes())
        .nest("/api/v1/videos", handlers::videos::routes())
        .nest("/api/v1/comments", handlers::comments::routes())
        .nest("/api/v1/tweets", handlers::tweets::routes())
        .nest("/api/v1/likes", handlers::likes::routes())
        .nest("/api/v1/subscriptions", handlers::subscriptions::routes())
        .nest("/api/v1/playlists", handlers::playlists::routes())
        .nest("/api/v1/dashboard", handlers::dashboard::routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
