use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use quill_api::auth::{self, AppState, AppStateInner};
use quill_api::middleware::require_auth;
use quill_api::{accounts, challenges, letters};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("QUILL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("QUILL_DB_PATH").unwrap_or_else(|_| "quill.db".into());
    let host = std::env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUILL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = quill_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes. The public letter listing mirrors the platform's open reading
    // room; everything else requires a bearer token.
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/letters", get(letters::list_letters))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/letters", post(letters::create_letter))
        .route("/letters/mine", get(letters::my_letters))
        .route("/letters/{id}", get(letters::letter_detail))
        .route("/letters/{id}", put(letters::edit_letter))
        .route("/letters/{id}", delete(letters::delete_letter))
        .route("/letters/{id}/continue", post(letters::continue_letter))
        .route("/letters/{id}/comments", post(letters::create_comment))
        .route("/letters/{id}/vote", post(letters::vote))
        .route("/letters/{id}/favorite", post(letters::favorite))
        .route("/challenges", get(challenges::list_challenges))
        .route("/challenges", post(challenges::create_challenge))
        .route("/challenges/mine", get(challenges::my_challenges))
        .route("/challenges/search/{term}", get(challenges::search_challenges))
        .route("/challenges/{id}", get(challenges::challenge_detail))
        .route("/challenges/{id}/stories", post(challenges::create_story))
        .route("/account", get(accounts::get_account))
        .route("/account", put(accounts::update_account))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Quill server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
