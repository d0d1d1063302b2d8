// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::collections::HashMap;
use std::{net::SocketAddr, sync::Arc};
use axum::{routing::{get, post}, Router};
use tokio::sync::{mpsc, watch};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::reading_sink::{forward_readings, ReadingSink};
use crate::application::scheduler::{AnimatorTask, Scheduler};
use crate::application::simulator::{ReadingSimulator, SimulatorTask};
use crate::domain::animation::ProgressAnimator;
use crate::infrastructure::config::load_monitor_config;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_dashboard, get_hmi, get_progress, health_check, list_dashboards, post_reading,
    stream_dashboard,
};
use crate::presentation::websocket::ingest_socket;

const SIMULATOR_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration; a bad registry aborts startup here
    let config = load_monitor_config()?;
    let monitor = config.build_service()?;
    tracing::info!("Loaded dashboards: {:?}", monitor.dashboard_ids());

    // One tick source drives every gauge animation and the simulator
    let mut scheduler = Scheduler::new();
    let mut progress = HashMap::new();
    for id in monitor.dashboard_ids() {
        let target = monitor.quality_target(&id)?;
        let (output, value) = watch::channel(0.0);
        scheduler.register(Box::new(AnimatorTask::new(
            id.clone(),
            ProgressAnimator::new(config.animation.duration(), config.animation.epsilon),
            target,
            output,
        )));
        progress.insert(id, value);
    }

    let (hmi_tx, hmi) = watch::channel(None);
    if config.simulator.enabled {
        let (queue, readings) = mpsc::channel(SIMULATOR_QUEUE);
        scheduler.register(Box::new(SimulatorTask::new(
            ReadingSimulator::new(config.simulator.seed),
            config.simulator.interval(),
            config.simulator.ph_channels.clone(),
            config.simulator.turbidity_channels.clone(),
            queue,
            hmi_tx,
        )));
        let sink: Arc<dyn ReadingSink> = Arc::new(monitor.clone());
        tokio::spawn(forward_readings(readings, sink));
        tracing::info!("Simulator enabled every {:?}", config.simulator.interval());
    }
    tokio::spawn(scheduler.run(config.scheduler.period()));

    let state = Arc::new(AppState {
        monitor,
        progress,
        hmi,
    });

    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/readings", post(post_reading))
        .route("/ws", get(ingest_socket))
        .route("/hmi", get(get_hmi))
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/:id", get(get_dashboard))
        .route("/dashboards/:id/stream", get(stream_dashboard))
        .route("/dashboards/:id/progress", get(get_progress))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!("Starting water-quality-monitor on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
