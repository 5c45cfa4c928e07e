//! GameVerse storefront runtime.
//!
//! Opens the local store, seeds it on first run, starts the background
//! catalog sync and keeps the catalog view state live until shutdown.
//!
//! # Architecture
//!
//! - SQLite local store, migrated on startup
//! - Remote game-search API, read by a detached sync task
//! - Reactive view state combining products, news and the logged-in profile
//!
//! Every view-state transition is logged, so the binary doubles as a smoke
//! test of the whole pipeline against a real database and catalog.

#![cfg_attr(not(test), forbid(unsafe_code))]

use gameverse_storefront::config::StorefrontConfig;
use gameverse_storefront::db::seed::seed_if_empty;
use gameverse_storefront::state::AppState;
use gameverse_storefront::view_state::ViewState;
use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gameverse_storefront=info,gameverse=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let state = AppState::from_config(config)
        .await
        .expect("Failed to open database");
    tracing::info!("Database ready");

    let seeded = seed_if_empty(state.database())
        .await
        .expect("Failed to seed database");
    if seeded.products > 0 || seeded.news > 0 {
        tracing::info!(
            products = seeded.products,
            news = seeded.news,
            "Seeded empty database"
        );
    }

    let aggregator = state.start_catalog();
    tracing::info!("Catalog view state started");

    tokio::select! {
        () = log_view_states(aggregator.subscribe()) => {},
        () = shutdown_signal() => {},
    }

    drop(aggregator);
    tracing::info!("Storefront stopped");
}

/// Log a one-line summary of every published view state.
async fn log_view_states(mut rx: watch::Receiver<ViewState>) {
    loop {
        {
            let view = rx.borrow_and_update();
            tracing::info!(
                products = view.products.len(),
                news = view.news.len(),
                highlights = view.highlights.len(),
                user = view.user_profile.as_ref().map(|u| u.username.as_str()),
                loading = view.loading,
                error = view.error.as_deref(),
                "View state"
            );
        }
        if rx.changed().await.is_err() {
            tracing::warn!("View state publisher stopped");
            return;
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, shutting down");
}
