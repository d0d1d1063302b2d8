use crate::application::ingestion_pipeline::{IngestionPipeline, PipelineSettings};
use crate::application::monitor_service::{DashboardError, MonitorService};
use crate::application::sensor_registry::{RegistryError, SensorRegistry};
use crate::domain::channel::{ChannelKind, ChannelSpec, ExtractionRule};
use crate::domain::quality::{ScoringProfile, ScoringThresholds};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    pub server: ServerSettings,
    pub scheduler: SchedulerSettings,
    pub animation: AnimationSettings,
    pub simulator: SimulatorSettings,
    pub dashboards: Vec<DashboardConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            scheduler: SchedulerSettings::default(),
            animation: AnimationSettings::default(),
            simulator: SimulatorSettings::default(),
            dashboards: default_dashboards(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchedulerSettings {
    pub tick_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { tick_ms: 16 }
    }
}

impl SchedulerSettings {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnimationSettings {
    pub duration_ms: u64,
    pub epsilon: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            duration_ms: 1000,
            epsilon: 0.5,
        }
    }
}

impl AnimationSettings {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulatorSettings {
    pub enabled: bool,
    pub interval_ms: u64,
    pub seed: Option<u64>,
    pub ph_channels: Vec<String>,
    pub turbidity_channels: Vec<String>,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 2500,
            seed: None,
            ph_channels: vec![
                "pH Sensor".to_string(),
                "pH Sensor 1".to_string(),
                "pH Sensor 2".to_string(),
            ],
            turbidity_channels: vec!["Turbidity Sensor".to_string()],
        }
    }
}

impl SimulatorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub id: String,
    pub profile: ScoringProfile,
    pub primary_channel: String,
    #[serde(default = "default_display_window")]
    pub display_window: usize,
    #[serde(default)]
    pub thresholds: ScoringThresholds,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    pub name: String,
    pub kind: ChannelKind,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    pub rules: Vec<String>,
}

fn default_display_window() -> usize {
    12
}

fn default_capacity() -> usize {
    12
}

fn channel(name: &str, kind: ChannelKind, capacity: usize, rules: &[&str]) -> ChannelConfig {
    ChannelConfig {
        name: name.to_string(),
        kind,
        capacity,
        rules: rules.iter().map(|r| r.to_string()).collect(),
    }
}

/// The live chart and the weekly report.
fn default_dashboards() -> Vec<DashboardConfig> {
    vec![
        DashboardConfig {
            id: "water-quality-chart".to_string(),
            profile: ScoringProfile::SingleSensor,
            primary_channel: "pH Sensor".to_string(),
            display_window: 12,
            thresholds: ScoringThresholds::default(),
            channels: vec![
                channel("pH Sensor", ChannelKind::Ph, 12, &["ph", "data.ph", "value"]),
                channel(
                    "Turbidity Sensor",
                    ChannelKind::Turbidity,
                    12,
                    &["turbidity", "data.turbidity", "value"],
                ),
            ],
        },
        DashboardConfig {
            id: "water-quality-report".to_string(),
            profile: ScoringProfile::MultiSensor,
            primary_channel: "pH Sensor 1".to_string(),
            display_window: 7,
            thresholds: ScoringThresholds::default(),
            channels: vec![
                channel("pH Sensor 1", ChannelKind::Ph, 10, &["pH", "value", "$"]),
                channel("pH Sensor 2", ChannelKind::Ph, 10, &["pH", "value", "$"]),
            ],
        },
    ]
}

impl ChannelConfig {
    pub fn to_spec(&self) -> Result<ChannelSpec, RegistryError> {
        let rules = self
            .rules
            .iter()
            .map(|text| {
                ExtractionRule::parse(text).ok_or_else(|| RegistryError::InvalidRule {
                    channel: self.name.clone(),
                    rule: text.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ChannelSpec::new(self.name.clone(), self.kind, self.capacity, rules))
    }
}

impl DashboardConfig {
    pub fn build_pipeline(&self) -> Result<IngestionPipeline, DashboardError> {
        if self.display_window == 0 {
            return Err(DashboardError::ZeroDisplayWindow(self.id.clone()));
        }

        let registry = self
            .channels
            .iter()
            .map(ChannelConfig::to_spec)
            .collect::<Result<Vec<_>, _>>()
            .and_then(SensorRegistry::new)
            .map_err(|source| DashboardError::Registry {
                dashboard: self.id.clone(),
                source,
            })?;

        if !registry.contains(&self.primary_channel) {
            return Err(DashboardError::UnknownPrimaryChannel {
                dashboard: self.id.clone(),
                channel: self.primary_channel.clone(),
            });
        }

        Ok(IngestionPipeline::new(
            registry,
            PipelineSettings {
                dashboard: self.id.clone(),
                profile: self.profile,
                primary_channel: self.primary_channel.clone(),
                display_window: self.display_window,
                thresholds: self.thresholds.clone(),
            },
        ))
    }
}

impl MonitorConfig {
    pub fn build_service(&self) -> Result<MonitorService, DashboardError> {
        let pipelines = self
            .dashboards
            .iter()
            .map(DashboardConfig::build_pipeline)
            .collect::<Result<Vec<_>, _>>()?;
        MonitorService::new(pipelines)
    }
}

/// Reads `config/monitor.toml` when present, then `WQM__*` environment overrides.
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/monitor").required(false))
        .add_source(config::Environment::with_prefix("WQM").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
