use std::sync::{Arc, Mutex};

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::models::prize::default_prizes;
use salonbook::services::automation::webhook::WebhookGateway;
use salonbook::services::automation::{LocalGateway, NotificationGateway};
use salonbook::services::clock::SystemClock;
use salonbook::services::random::ThreadRandom;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    if config.uses_default_admin_token() {
        tracing::warn!("ADMIN_TOKEN not set, admin API is using the default token");
    }

    let conn = db::init_db(&config.database_url)?;
    let catalog = config.load_catalog()?;
    tracing::info!("loaded {} services", catalog.services.len());

    let gateway: Box<dyn NotificationGateway> = match &config.automation_url {
        Some(url) => {
            tracing::info!("using webhook automation gateway (url: {url})");
            Box::new(WebhookGateway::new(url.clone()))
        }
        None => {
            tracing::info!("AUTOMATION_URL not set, automation events stay local");
            Box::new(LocalGateway)
        }
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        catalog,
        prizes: default_prizes(),
        gateway,
        clock: Box::new(SystemClock),
        rng: Box::new(ThreadRandom),
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
