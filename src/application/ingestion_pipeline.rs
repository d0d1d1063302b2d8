// Ingestion pipeline - Routes inbound messages into channel windows and rescoring
use crate::application::quality_scorer;
use crate::application::sensor_registry::SensorRegistry;
use crate::domain::quality::{QualitySnapshot, ScoringProfile, ScoringThresholds};
use crate::domain::reading::{InboundMessage, SensorReading};
use serde::Serialize;

/// What the presentation layer receives after every accepted reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub dashboard: String,
    pub reading: SensorReading,
    /// Trailing window of the primary channel, oldest first.
    pub series: Vec<f64>,
    pub quality: QualitySnapshot,
}

/// Why a message did not change any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingChannel,
    MissingPayload,
    UnknownChannel,
    Unresolvable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum IngestOutcome {
    Accepted,
    Dropped(DropReason),
}

pub trait SnapshotObserver: Send {
    fn notify(&mut self, notification: &Notification);
}

impl<F> SnapshotObserver for F
where
    F: FnMut(&Notification) + Send,
{
    fn notify(&mut self, notification: &Notification) {
        self(notification)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Per-dashboard settings the pipeline needs besides its registry.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub dashboard: String,
    pub profile: ScoringProfile,
    pub primary_channel: String,
    pub display_window: usize,
    pub thresholds: ScoringThresholds,
}

/// Sole owner of the windows and the current snapshot for one dashboard.
pub struct IngestionPipeline {
    registry: SensorRegistry,
    settings: PipelineSettings,
    last_snapshot: Option<QualitySnapshot>,
    last_notification: Option<Notification>,
    observers: Vec<(SubscriptionId, Box<dyn SnapshotObserver>)>,
    next_subscription: u64,
}

impl IngestionPipeline {
    pub fn new(registry: SensorRegistry, settings: PipelineSettings) -> Self {
        Self {
            registry,
            settings,
            last_snapshot: None,
            last_notification: None,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn SnapshotObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Processes one message to completion. Rejected messages leave every
    /// window untouched and produce no notification.
    pub fn on_message(&mut self, message: &InboundMessage) -> IngestOutcome {
        let dashboard = &self.settings.dashboard;

        let Some(channel) = message.channel.as_deref() else {
            tracing::warn!("[{}] Dropping message without channel: {:?}", dashboard, message.payload);
            return IngestOutcome::Dropped(DropReason::MissingChannel);
        };
        let Some(payload) = message.payload.as_ref() else {
            tracing::warn!("[{}] Dropping message without payload from {}", dashboard, channel);
            return IngestOutcome::Dropped(DropReason::MissingPayload);
        };
        if !self.registry.contains(channel) {
            tracing::debug!("[{}] Ignoring unrecognised sensor {}", dashboard, channel);
            return IngestOutcome::Dropped(DropReason::UnknownChannel);
        }
        let Some(value) = self.registry.extract(channel, payload) else {
            let rules = self
                .registry
                .spec(channel)
                .map(|spec| spec.rules.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            tracing::warn!("[{}] No numeric value for {} in {} (tried {})", dashboard, channel, payload, rules);
            return IngestOutcome::Dropped(DropReason::Unresolvable);
        };

        let Some(buffer) = self.registry.resolve(channel) else {
            return IngestOutcome::Dropped(DropReason::UnknownChannel);
        };
        buffer.push(value);
        tracing::trace!("[{}] {} <- {}", dashboard, channel, value);

        let snapshot = quality_scorer::score(
            &self.registry.windows(),
            self.settings.profile,
            &self.settings.thresholds,
            self.last_snapshot.as_ref(),
        );
        let series = self
            .registry
            .buffer(&self.settings.primary_channel)
            .map(|b| b.tail(self.settings.display_window))
            .unwrap_or_default();

        let notification = Notification {
            dashboard: dashboard.clone(),
            reading: SensorReading::new(channel.to_string(), value),
            series,
            quality: snapshot.clone(),
        };
        for (_, observer) in self.observers.iter_mut() {
            observer.notify(&notification);
        }

        self.last_snapshot = Some(snapshot);
        self.last_notification = Some(notification);
        IngestOutcome::Accepted
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.last_notification.as_ref()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }
}
