//! SSE endpoint streaming monitor events for one wallet address.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use crate::error::AppError;
use crate::utils::validation::validate_address;
use crate::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

pub fn create_event_routes() -> Router<AppState> {
    Router::new().route("/positions/:address", get(position_stream))
}

async fn position_stream(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let address = validate_address(Some(&address), "address")?.to_lowercase();
    let subscription = state.events.subscribe(&address)?;

    let connected = stream::once(async move {
        Ok(Event::default()
            .data(json!({ "type": "connected", "address": address }).to_string()))
    });

    let updates = stream::unfold(subscription, |mut sub| async move {
        loop {
            match sub.receiver.recv().await {
                Ok(event) => {
                    if event.address.to_lowercase() != sub.address() {
                        continue;
                    }
                    let payload = serde_json::to_string(&event).unwrap_or_default();
                    return Some((Ok(Event::default().data(payload)), sub));
                }
                // Skipping missed events is acceptable; the client can poll
                // the events endpoint for the backlog.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(connected.chain(updates)).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    ))
}
