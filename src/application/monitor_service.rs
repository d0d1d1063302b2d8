// Monitor service - Hosts one ingestion pipeline per dashboard
use crate::application::ingestion_pipeline::{IngestionPipeline, Notification, SnapshotObserver};
use crate::application::reading_sink::{DashboardOutcome, ReadingSink};
use crate::application::sensor_registry::RegistryError;
use crate::domain::reading::InboundMessage;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex};

const UPDATE_BUFFER: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum DashboardError {
    #[error("dashboard '{dashboard}': {source}")]
    Registry {
        dashboard: String,
        #[source]
        source: RegistryError,
    },
    #[error("dashboard '{dashboard}': primary channel '{channel}' is not declared")]
    UnknownPrimaryChannel { dashboard: String, channel: String },
    #[error("dashboard '{0}': display window must be at least 1")]
    ZeroDisplayWindow(String),
    #[error("dashboard '{0}' is declared more than once")]
    DuplicateDashboard(String),
    #[error("unknown dashboard '{0}'")]
    UnknownDashboard(String),
}

/// Forwards notifications to any number of async subscribers.
struct BroadcastObserver(broadcast::Sender<Notification>);

impl SnapshotObserver for BroadcastObserver {
    fn notify(&mut self, notification: &Notification) {
        // No receivers is fine: nobody is watching this dashboard right now.
        let _ = self.0.send(notification.clone());
    }
}

/// Publishes the latest quality percentage for the progress animation.
struct QualityTargetObserver(watch::Sender<f64>);

impl SnapshotObserver for QualityTargetObserver {
    fn notify(&mut self, notification: &Notification) {
        self.0
            .send_replace(f64::from(notification.quality.quality_percentage));
    }
}

struct Dashboard {
    pipeline: Mutex<IngestionPipeline>,
    updates: broadcast::Sender<Notification>,
    quality: watch::Receiver<f64>,
}

#[derive(Clone)]
pub struct MonitorService {
    dashboards: Arc<BTreeMap<String, Dashboard>>,
}

impl MonitorService {
    pub fn new(pipelines: Vec<IngestionPipeline>) -> Result<Self, DashboardError> {
        let mut dashboards = BTreeMap::new();

        for mut pipeline in pipelines {
            let id = pipeline.settings().dashboard.clone();
            if dashboards.contains_key(&id) {
                return Err(DashboardError::DuplicateDashboard(id));
            }

            let (updates, _) = broadcast::channel(UPDATE_BUFFER);
            let (quality_tx, quality) = watch::channel(pipeline.settings().thresholds.baseline_quality);
            pipeline.subscribe(Box::new(BroadcastObserver(updates.clone())));
            pipeline.subscribe(Box::new(QualityTargetObserver(quality_tx)));

            dashboards.insert(
                id,
                Dashboard {
                    pipeline: Mutex::new(pipeline),
                    updates,
                    quality,
                },
            );
        }

        Ok(Self {
            dashboards: Arc::new(dashboards),
        })
    }

    pub fn dashboard_ids(&self) -> Vec<String> {
        self.dashboards.keys().cloned().collect()
    }

    pub async fn latest(&self, id: &str) -> Result<Option<Notification>, DashboardError> {
        let dashboard = self.dashboard(id)?;
        let pipeline = dashboard.pipeline.lock().await;
        Ok(pipeline.last_notification().cloned())
    }

    pub fn subscribe(&self, id: &str) -> Result<broadcast::Receiver<Notification>, DashboardError> {
        Ok(self.dashboard(id)?.updates.subscribe())
    }

    /// Latest quality percentage, for consumers that only need the scalar.
    pub fn quality_target(&self, id: &str) -> Result<watch::Receiver<f64>, DashboardError> {
        Ok(self.dashboard(id)?.quality.clone())
    }

    fn dashboard(&self, id: &str) -> Result<&Dashboard, DashboardError> {
        self.dashboards
            .get(id)
            .ok_or_else(|| DashboardError::UnknownDashboard(id.to_string()))
    }
}

#[async_trait]
impl ReadingSink for MonitorService {
    async fn ingest(&self, message: InboundMessage) -> Vec<DashboardOutcome> {
        let mut outcomes = Vec::with_capacity(self.dashboards.len());
        for (id, dashboard) in self.dashboards.iter() {
            let outcome = dashboard.pipeline.lock().await.on_message(&message);
            outcomes.push(DashboardOutcome {
                dashboard: id.clone(),
                outcome,
            });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ingestion_pipeline::{DropReason, IngestOutcome, PipelineSettings};
    use crate::application::sensor_registry::SensorRegistry;
    use crate::domain::channel::{ChannelKind, ChannelSpec, ExtractionRule};
    use crate::domain::quality::{ScoringProfile, ScoringThresholds};
    use serde_json::json;

    fn pipeline(id: &str, channel: &str) -> IngestionPipeline {
        let registry = SensorRegistry::new(vec![ChannelSpec::new(
            channel,
            ChannelKind::Ph,
            12,
            vec![ExtractionRule::parse("ph").unwrap(), ExtractionRule::parse("value").unwrap()],
        )])
        .unwrap();
        IngestionPipeline::new(
            registry,
            PipelineSettings {
                dashboard: id.into(),
                profile: ScoringProfile::SingleSensor,
                primary_channel: channel.into(),
                display_window: 12,
                thresholds: ScoringThresholds::default(),
            },
        )
    }

    #[test]
    fn test_duplicate_dashboard_rejected() {
        let result = MonitorService::new(vec![pipeline("chart", "pH Sensor"), pipeline("chart", "pH Sensor 1")]);
        assert_eq!(result.err(), Some(DashboardError::DuplicateDashboard("chart".into())));
    }

    #[tokio::test]
    async fn test_fan_out_to_every_dashboard() {
        let service =
            MonitorService::new(vec![pipeline("chart", "pH Sensor"), pipeline("report", "pH Sensor 1")]).unwrap();

        let outcomes = service
            .ingest(InboundMessage::new("pH Sensor", json!({"ph": 9.0})))
            .await;

        assert_eq!(
            outcomes,
            vec![
                DashboardOutcome {
                    dashboard: "chart".into(),
                    outcome: IngestOutcome::Accepted,
                },
                DashboardOutcome {
                    dashboard: "report".into(),
                    outcome: IngestOutcome::Dropped(DropReason::UnknownChannel),
                },
            ]
        );
        assert!(service.latest("chart").await.unwrap().is_some());
        assert!(service.latest("report").await.unwrap().is_none());
        assert_eq!(
            service.latest("missing").await.unwrap_err(),
            DashboardError::UnknownDashboard("missing".into())
        );
    }

    #[tokio::test]
    async fn test_subscribers_and_quality_target() {
        let service = MonitorService::new(vec![pipeline("chart", "pH Sensor")]).unwrap();
        let mut updates = service.subscribe("chart").unwrap();
        let quality = service.quality_target("chart").unwrap();
        assert_eq!(*quality.borrow(), 100.0);

        service
            .ingest(InboundMessage::new("pH Sensor", json!({"value": 5.0})))
            .await;

        let notification = updates.recv().await.unwrap();
        assert_eq!(notification.series, vec![5.0]);
        assert_eq!(notification.quality.quality_percentage, 80);
        assert_eq!(*quality.borrow(), 80.0);
    }

    #[tokio::test]
    async fn test_dropped_message_publishes_nothing() {
        let service = MonitorService::new(vec![pipeline("chart", "pH Sensor")]).unwrap();
        let mut updates = service.subscribe("chart").unwrap();

        service.ingest(InboundMessage::from_json_str("{}")).await;

        assert!(matches!(
            updates.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
