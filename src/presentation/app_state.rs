// Application state for HTTP handlers
use crate::application::monitor_service::MonitorService;
use crate::application::simulator::HmiSample;
use std::collections::HashMap;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub monitor: MonitorService,
    /// Animated gauge value per dashboard.
    pub progress: HashMap<String, watch::Receiver<f64>>,
    pub hmi: watch::Receiver<Option<HmiSample>>,
}
