//! Server-Sent Events stream of committed location records.

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use qcsite_collector::LOCATION_UPDATED_EVENT;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct EventsQuery {
    /// Only forward records for this location (case-insensitive).
    pub location: Option<String>,
}

pub(super) async fn stream_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    let filter = params.location;

    let events = stream::unfold((rx, filter), |(mut rx, filter)| async move {
        loop {
            match rx.recv().await {
                Ok(record) => {
                    if let Some(wanted) = &filter {
                        if !record.location.name.eq_ignore_ascii_case(wanted.trim()) {
                            continue;
                        }
                    }
                    let event = match Event::default()
                        .event(LOCATION_UPDATED_EVENT)
                        .json_data(record.as_ref())
                    {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to encode location event");
                            continue;
                        }
                    };
                    return Some((Ok(event), (rx, filter)));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event subscriber lagged; skipping ahead");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
