use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_booking::{
    app,
    config::Config,
    store::{seed, BookingStore, MemoryStore, PgStore},
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // В production логи в JSON
    let json_logs = config.app.environment == "production";
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    info!("Starting Cinema Booking API ({})", config.app.environment);

    // Хранилище: Postgres если задан DATABASE_URL, иначе память
    let store: Arc<dyn BookingStore> = match &config.database {
        Some(db_config) => {
            let store = PgStore::connect(db_config)
                .await
                .context("Failed to connect to database")?;
            store
                .run_migrations()
                .await
                .context("Failed to run migrations")?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL is not set, bookings are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    if seed::seed_catalog(store.as_ref()).await? {
        info!("Empty catalog seeded");
    }
    seed::ensure_admin(store.as_ref(), &config.admin, config.security.bcrypt_cost).await?;

    let app_state = AppState::new(store, config.clone());
    let router = app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.app.host, config.app.port))?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
