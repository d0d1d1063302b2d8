// Server-sent event streaming of dashboard notifications
use crate::application::ingestion_pipeline::Notification;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

/// One `snapshot` event per notification. Slow clients skip what they
/// missed instead of holding the sender back.
pub fn notification_events(
    rx: broadcast::Receiver<Notification>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    BroadcastStream::new(rx).filter_map(|item| async move {
        match item {
            Ok(notification) => to_event(&notification).map(Ok),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("SSE subscriber lagged, skipped {} notifications", skipped);
                None
            }
        }
    })
}

pub fn sse_response(
    rx: broadcast::Receiver<Notification>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    Sse::new(notification_events(rx)).keep_alive(KeepAlive::default())
}

fn to_event(notification: &Notification) -> Option<Event> {
    match Event::default().event("snapshot").json_data(notification) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::error!("Failed to encode notification for {}: {}", notification.dashboard, e);
            None
        }
    }
}
