use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_reservation::{
    app,
    cache::RedisChallengeStore,
    config::Config,
    database::Database,
    redis_client::RedisClient,
    store::PgStore,
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("failed to load configuration")?;

    let filter = tracing_subscriber::EnvFilter::new(&config.app.rust_log);
    if config.app.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting Movie Reservation API ({})", config.app.environment);

    // Connect to the database
    let db = Database::new(&config.database)
        .await
        .context("failed to connect to database")?;

    // Run migrations
    db.run_migrations()
        .await
        .context("failed to run migrations")?;

    // Connect to Redis
    let redis = RedisClient::connect(&config.redis.url)
        .await
        .context("failed to connect to redis")?;

    let state = AppState::new(
        config.clone(),
        Arc::new(PgStore::new(&db)),
        Arc::new(RedisChallengeStore::new(redis)),
    );

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .context("invalid listen address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app(state).into_make_service()).await?;

    Ok(())
}
