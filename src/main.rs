use actix_web::{web, App, HttpServer};
use anyhow::Context;
use fee_ledger::config::{Config, DatabaseConfig, LogFormat};
use fee_ledger::middleware::RequestId;
use fee_ledger::AppServices;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat, level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("fee_ledger={},actix_web=info", level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.app.log_format, &config.app.log_level);
    config.validate().context("Configuration validation failed")?;

    tracing::info!(
        env = %config.app.env,
        production = config.is_production(),
        currency = %config.app.currency,
        bind = %config.server.bind_address(),
        "Starting fee ledger"
    );

    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;
    DatabaseConfig::migrate(&db_pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!(
        database = %config.database.redacted_url(),
        pool_size = config.database.pool_size,
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    let services = AppServices::from_config(&db_pool, &config);

    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let shutdown_timeout = config.server.shutdown_timeout;
    HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestId)
            .app_data(web::Data::new(db_pool.clone()))
            .configure(move |cfg| services.configure(cfg))
    })
    .workers(workers)
    .shutdown_timeout(shutdown_timeout)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await?;

    Ok(())
}
