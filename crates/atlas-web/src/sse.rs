//! Server-Sent Events (SSE) streaming of panel snapshots.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::SharedState;

/// Stream panel snapshots and banner changes to subscribed clients.
pub async fn sse_handler(State(state): State<SharedState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    // Lagged receivers skip what they missed; the next snapshot is complete.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        result.ok().and_then(|envelope| {
            serde_json::to_string(&envelope).ok().map(|data| {
                Ok(Event::default().id(envelope.id.to_string()).data(data))
            })
        })
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}
