// Inbound seam - Anything that accepts decoded sensor messages
use crate::application::ingestion_pipeline::IngestOutcome;
use crate::domain::reading::InboundMessage;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outcome of one message for one dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOutcome {
    pub dashboard: String,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

#[async_trait]
pub trait ReadingSink: Send + Sync {
    /// Offer a message to every dashboard. Never fails; rejected messages
    /// are reported in the outcomes.
    async fn ingest(&self, message: InboundMessage) -> Vec<DashboardOutcome>;
}

/// Feed a queue of messages into a sink until every sender is gone.
pub async fn forward_readings(mut rx: mpsc::Receiver<InboundMessage>, sink: Arc<dyn ReadingSink>) {
    while let Some(message) = rx.recv().await {
        sink.ingest(message).await;
    }
    tracing::debug!("Reading queue closed");
}
