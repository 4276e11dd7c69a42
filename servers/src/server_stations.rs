use anyhow::{Context, Result};
use lib_stations::chat::GeminiClient;
use lib_stations::loggers::setup_logging;
use lib_stations::stations::{LocalClock, load_stations_file, seed_stations};
use lib_stations::{SessionHub, StationRegistry};
use servers::stations_logic::{config, downstream, state};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = config::load_config()?;
    let log_path = setup_logging(&settings.log_dir, &settings.log_level, "server_stations")?;
    for note in &settings.notes {
        log::info!("{}", note);
    }
    log::info!("Logging to {}", log_path.display());

    let stations = match &settings.stations_file {
        Some(path) => load_stations_file(path)?,
        None => seed_stations(),
    };
    let registry = StationRegistry::with_stations(stations).context("invalid station list")?;
    log::info!(
        "Loaded {} stations, radius {} km, updates every {:?}",
        registry.len(),
        settings.radius_km,
        settings.update_interval
    );

    let hub = SessionHub::with_options(Arc::new(registry), settings.radius_km, Arc::new(LocalClock));

    let chat = match &settings.chat {
        Some(chat) => {
            let client = GeminiClient::new(&chat.base_url, &chat.model, &chat.api_key, chat.timeout)?;
            log::info!("Chat enabled with model {}", client.model());
            Some(client)
        }
        None => {
            log::info!("No chat API key configured, chat replies will report an error.");
            None
        }
    };

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let app_state = state::AppState::new(Arc::new(hub), chat, settings.update_interval);

    let downstream_handle = tokio::spawn(downstream::run(
        settings.port,
        app_state,
        shutdown_tx.subscribe(),
    ));

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = terminate() => {
            log::info!("SIGTERM received, initiating shutdown.");
        }
    }

    let _ = shutdown_tx.send(());
    downstream_handle.await??;

    log::info!("Shutdown complete.");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut term_signal) => {
            term_signal.recv().await;
        }
        Err(e) => {
            log::warn!("Cannot listen for SIGTERM: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    // On non-unix platforms, just wait forever.
    std::future::pending::<()>().await;
}
