// Points Manager Gateway - process entry point
// Owns the account actor for the lifetime of the process

use points_core::{spawn_account_actor, Account, Config, Metrics};
use points_gateway::{router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn load_config() -> anyhow::Result<Config> {
    // POINTS_CONFIG takes precedence over individual variables
    match std::env::var("POINTS_CONFIG") {
        Ok(path) => Ok(Config::from_file(path)?),
        Err(_) => Ok(Config::from_env()?),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(config.log_json);

    info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting points manager gateway"
    );

    let account = match &config.seed_path {
        Some(path) => {
            info!("Seeding account from {}", path.display());
            Account::from_seed_file(path)?
        }
        None => Account::new(),
    };

    let metrics = Metrics::new()?;
    let handle = spawn_account_actor(account, config.mailbox_capacity, metrics.clone());

    let state = AppState {
        account: handle.clone(),
        metrics,
        service_name: config.service_name.clone(),
        service_version: config.service_version.clone(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.http_listen_addr).await?;
    info!("Gateway listening on: {}", config.http_listen_addr);
    info!("   GET   /api/points-manager/get-balance");
    info!("   PATCH /api/points-manager/add-transaction");
    info!("   PATCH /api/points-manager/redeem-points");
    info!("   GET   /health");
    info!("   GET   /metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    handle.shutdown().await?;
    info!("Shutting down points manager gateway");
    Ok(())
}
