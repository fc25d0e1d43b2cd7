use server::config;
use server::db;
use server::routes;
use server::session_store::SessionStore;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    // Connect to Postgres
    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run schema migrations
    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    // Live lesson sessions, one engine instance per started lesson
    let sessions = SessionStore::default();

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Puzzle corpus — specific routes before parameterized
        .route("/api/puzzles/themes", get(routes::puzzles::get_themes))
        .route("/api/puzzles", get(routes::puzzles::get_puzzles))
        .route("/api/admin/puzzles/upload", post(routes::puzzles::upload_puzzles))
        .route("/api/admin/puzzles/import", post(routes::puzzles::import_puzzles))
        // Lesson sessions
        .route("/api/sessions", post(routes::session::start_session))
        .route(
            "/api/sessions/{session_id}",
            get(routes::session::get_session).delete(routes::session::end_session),
        )
        .route("/api/sessions/{session_id}/moves", post(routes::session::play_move))
        .route(
            "/api/sessions/{session_id}/legal-moves",
            get(routes::session::legal_moves),
        )
        .route("/api/sessions/{session_id}/reveal", post(routes::session::reveal_solution))
        .route(
            "/api/sessions/{session_id}/continue",
            post(routes::session::continue_session),
        )
        // Progress
        .route("/api/progress", get(routes::progress::get_progress))
        // Shared state
        .layer(Extension(pool))
        .layer(Extension(config.clone()))
        .layer(Extension(sessions))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
