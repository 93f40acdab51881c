//! DopeTech Nepal commerce service entry point.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dopetech_commerce::api;
use dopetech_commerce::config::Config;
use dopetech_commerce::email::Mailer;
use dopetech_commerce::state::AppState;
use dopetech_commerce::storage::ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let storage = match &config.storage {
        Some(storage) => ObjectStore::new(&storage.url, &storage.key),
        None => ObjectStore::disabled(),
    };
    let mailer = match &config.email {
        Some(email) => Mailer::new(&email.api_url, &email.api_key, &email.from),
        None => Mailer::disabled(),
    };
    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(err) => {
                warn!(error = %err, "NATS connection failed, order events disabled");
                None
            }
        },
        None => None,
    };

    let port = config.port;
    let state = AppState::new(db, storage, mailer, nats, config);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("🚀 DopeTech commerce listening on 0.0.0.0:{port}");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        info!("received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
