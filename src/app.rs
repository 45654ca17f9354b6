/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config 読み込み → storage backend 選択 → AppState 組み立て
 * - Router 組み立て (/health, /api/v1, HTTP middleware)
 * - axum::serve() で起動、Ctrl-C / SIGTERM で graceful shutdown
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{Config, StorageBackend};
use crate::middleware::http::{self, HttpPolicy};
use crate::repos::{MemoryStore, PgSnippetRepo, PgUserRepo, SnippetRepo, UserRepo};
use crate::services::auth::TokenCodec;
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG=info,snippet_manager=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: プロセスごと落として気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(?config, "starting API in {:?} mode on {}", config.app_env, config.addr);

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let (snippets, users) = match &config.storage {
        StorageBackend::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(config.storage_timeout)
                .connect(database_url)
                .await
                .context("failed to connect to postgres")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;

            let snippets: Arc<dyn SnippetRepo> = Arc::new(PgSnippetRepo::new(pool.clone()));
            let users: Arc<dyn UserRepo> = Arc::new(PgUserRepo::new(pool));
            (snippets, users)
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            let snippets: Arc<dyn SnippetRepo> = store.clone();
            let users: Arc<dyn UserRepo> = store;
            (snippets, users)
        }
    };

    Ok(AppState::assemble(
        snippets,
        users,
        TokenCodec::new(&config.jwt_secret, config.token_ttl_seconds),
        config.admission,
        config.storage_timeout,
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    http::apply(router, HttpPolicy::with_timeout(config.request_timeout))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
