//! Passenger welcome worker.
//!
//! Reacts to the driver door: on open it moves the seat back and switches
//! the interior and low beam lights on, on close it moves the seat to the
//! driving position and, after a delay, switches the lights off.
//!
//! Configuration comes from environment variables (see
//! [`WorkerConfig::from_env`]); a `.env` file is honoured.

use anyhow::Context;
use welcome_worker::{telemetry, WelcomeService, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;

    // --- Tracing ---
    telemetry::init_tracing(config.log_format);
    tracing::info!(
        lights_off_delay = ?config.lights_off_delay,
        scenario_file = ?config.scenario_file,
        bus_capacity = config.bus_capacity,
        "Loaded worker configuration",
    );

    // --- Service ---
    let service = WelcomeService::start(&config)
        .await
        .context("Failed to start welcome service")?;
    tracing::info!("Welcome service running");

    shutdown_signal().await;

    // --- Shutdown ---
    service.shutdown().await;
    tracing::info!("Graceful shutdown complete");

    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
