// ============================================================================
// Auth Service - IoT telemetry authorization gateway
// ============================================================================
//
// Subscribes to the public broker, authorizes device payloads against the
// metadata cache, and republishes the survivors on the internal broker.
// Handles:
// - Measurement and message ingress (single and bulk topics)
// - Secret validation (plaintext and SHA-256 substitution modes)
// - Periodic cache reload from PostgreSQL and MongoDB
// - Cache-invalidation commands on the control topic
//
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sensorgate_config::Config;
use sensorgate_shared::consumers::CommandConsumer;
use sensorgate_shared::mqtt::{self, MessagePublisher};
use sensorgate_shared::repositories::{
    ApiKeyRepository, MongoSensorRepository, PgApiKeyRepository, PgUserRepository,
    SensorRepository, UserRepository,
};
use sensorgate_shared::services::MessageService;

/// Minimum sleep between ticks when processing overruns the interval.
const MIN_TICK_SLEEP_MS: u64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    init_tracing(&config)?;

    info!("starting sensorgate auth service");

    // Repositories
    let pool = PgPoolOptions::new()
        .max_connections(config.database.pgsql.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.pgsql.acquire_timeout_secs))
        .connect(&config.database.pgsql.connection_string)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let mongo = mongodb::Client::with_uri_str(&config.database.mongodb.connection_string)
        .await
        .context("Failed to connect to MongoDB")?;
    let database = mongo.database(&config.database.mongodb.database_name);

    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let keys: Arc<dyn ApiKeyRepository> = Arc::new(PgApiKeyRepository::new(pool));
    let sensors: Arc<dyn SensorRepository> = Arc::new(MongoSensorRepository::new(&database));

    // Brokers
    let (internal_client, internal_eventloop) =
        mqtt::connect(&config.mqtt.internal_broker, "sensorgate-auth-internal")
            .context("Failed to configure internal broker client")?;
    let (public_client, public_eventloop) =
        mqtt::connect(&config.mqtt.public_broker, "sensorgate-auth-public")
            .context("Failed to configure public broker client")?;

    let commands = Arc::new(CommandConsumer::new());
    let publisher: Arc<dyn MessagePublisher> = Arc::new(internal_client.clone());

    let service = Arc::new(
        MessageService::new(
            publisher,
            Arc::clone(&commands),
            users,
            keys,
            sensors,
            &config,
        )
        .await,
    );

    info!(workers = config.workers, "message service started");

    tokio::spawn(mqtt::inbound::run_internal_pump(
        internal_client,
        internal_eventloop,
        Arc::clone(&commands),
        config.mqtt.internal_broker.clone(),
    ));

    tokio::spawn(mqtt::inbound::run_public_pump(
        public_client,
        public_eventloop,
        Arc::clone(&service),
        config.mqtt.public_broker.clone(),
    ));

    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_signal_handler(Arc::clone(&shutdown));

    // Tick loop: process, then sleep for whatever is left of the interval.
    loop {
        if shutdown.load(Ordering::Acquire) {
            info!("shutting down, draining pending payloads");
            service.process().await;
            break;
        }

        let elapsed = service.process().await;

        let sleep_ms = if elapsed >= config.interval_ms {
            MIN_TICK_SLEEP_MS
        } else {
            config.interval_ms - elapsed
        };

        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
    }

    info!("sensorgate auth service stopped");
    Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(config.logging.level.clone());

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to open log file {path}"))?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

fn spawn_signal_handler(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(err) => {
                    error!(error = %err, "failed to install SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM"),
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        error!(error = %err, "failed to listen for ctrl-c");
                    } else {
                        info!("received ctrl-c");
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for ctrl-c");
            } else {
                info!("received ctrl-c");
            }
        }

        shutdown.store(true, Ordering::Release);
    });
}
