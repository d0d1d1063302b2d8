// WebSocket transport - One inbound sensor message per text frame
use crate::application::ingestion_pipeline::IngestOutcome;
use crate::application::reading_sink::ReadingSink;
use crate::domain::reading::InboundMessage;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn ingest_socket(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    tracing::info!("Sensor transport connected");

    while let Some(frame) = socket.recv().await {
        match frame {
            Ok(Message::Text(text)) => {
                let outcomes = state.monitor.ingest(InboundMessage::from_json_str(&text)).await;
                let accepted = outcomes
                    .iter()
                    .filter(|o| o.outcome == IngestOutcome::Accepted)
                    .count();
                tracing::trace!("Frame accepted by {} dashboards", accepted);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Sensor transport error: {}", e);
                break;
            }
        }
    }

    tracing::info!("Sensor transport disconnected");
}
