use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use duet_api::middleware::require_auth;
use duet_api::storage::MediaStore;
use duet_api::{
    AppState, AppStateInner, auth, comments, countdown, letters, likes, location, media, memories,
    voice,
};
use duet_store::{MemoryStore, SqliteStore, Store};

/// Uploads top out at 10 MB; leave headroom for multipart framing.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duet=debug,tower_http=debug".into()),
        )
        .init();

    // Config; the secrets have no defaults on purpose.
    let jwt_secret = std::env::var("DUET_JWT_SECRET").context("DUET_JWT_SECRET must be set")?;
    let him_password =
        std::env::var("DUET_HIM_PASSWORD").context("DUET_HIM_PASSWORD must be set")?;
    let her_password =
        std::env::var("DUET_HER_PASSWORD").context("DUET_HER_PASSWORD must be set")?;
    let him_name = std::env::var("DUET_HIM_NAME").unwrap_or_else(|_| "Him".into());
    let her_name = std::env::var("DUET_HER_NAME").unwrap_or_else(|_| "Her".into());
    let host = std::env::var("DUET_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("DUET_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .context("DUET_PORT must be a port number")?;
    let db_path = std::env::var("DUET_DB_PATH").unwrap_or_else(|_| "duet.db".into());
    let media_dir = std::env::var("DUET_MEDIA_DIR").unwrap_or_else(|_| "./media".into());

    let store: Arc<dyn Store> = match std::env::var("DUET_STORE").as_deref() {
        Ok("memory") => {
            info!("Using in-memory store with demo data");
            Arc::new(MemoryStore::seeded())
        }
        _ => {
            info!("Opening database at {}", db_path);
            Arc::new(SqliteStore::open(&PathBuf::from(&db_path))?)
        }
    };

    let media = MediaStore::new(PathBuf::from(media_dir)).await?;

    let state: AppState = Arc::new(AppStateInner {
        store,
        media,
        jwt_secret,
        him_password,
        her_password,
        him_name,
        her_name,
    });

    // Routes
    let public_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/location/sync", post(location::sync))
        .route("/api/location/status", get(location::status))
        .route("/api/location/history", get(location::history))
        .route("/api/memories", get(memories::list_memories))
        .route("/api/memories/upload", post(memories::upload_memory))
        .route(
            "/api/memories/likes",
            get(likes::get_likes).post(likes::toggle_like),
        )
        .route(
            "/api/memories/comments",
            get(comments::list_comments)
                .post(comments::add_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route(
            "/api/countdown",
            get(countdown::list_events)
                .post(countdown::create_event)
                .delete(countdown::delete_all_events),
        )
        .route(
            "/api/countdown/{id}",
            get(countdown::get_event)
                .put(countdown::update_event)
                .delete(countdown::delete_event),
        )
        .route(
            "/api/letters",
            get(letters::list_letters).post(letters::compose_letter),
        )
        .route(
            "/api/letters/{id}",
            put(letters::mark_letter_read).delete(letters::delete_letter),
        )
        .route("/api/letters/{id}/thread", get(letters::get_thread))
        .route(
            "/api/voice-messages",
            get(voice::list_messages).post(voice::send_message),
        )
        .route(
            "/api/voice-messages/{id}",
            patch(voice::mark_read).delete(voice::delete_message),
        )
        .route("/media/{id}", get(media::serve_media))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("invalid bind address")?;
    info!("Duet server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
