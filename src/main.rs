mod api;
mod app;
mod application;
mod config;
mod domain;
mod ui;
mod utils;

use std::sync::Arc;

use log::{error, info};

use application::DownloadCoordinator;
use config::ManagerConfig;
use domain::{AppError, Catalog};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ManagerConfig::from_env()?;
    let catalog = Arc::new(Catalog::open(&config)?);

    // Transfers run here; dropping it at exit abandons any in-flight download
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| AppError::Io(format!("Failed to start download runtime: {}", e)))?;
    let coordinator = DownloadCoordinator::new(catalog, &config, runtime.handle().clone())?;
    info!(
        "Managing {} models in {}",
        coordinator.list_artifacts().len(),
        coordinator.catalog().models_dir().display()
    );
    let poll_interval = config.poll_interval;

    iced::application(
        move || app::ModelManagerApp::new(coordinator.clone(), poll_interval),
        app::update,
        app::view,
    )
    .title("AI Model Manager")
    .subscription(app::subscription)
    .window_size((600.0, 500.0))
    .run()?;

    runtime.shutdown_background();
    Ok(())
}
