//! # Live Tracking Stream Route
//!
//! Bridges one HTTP connection to one tracking engine task. The handler
//! authorizes the caller, spawns the engine with a channel and cancellation
//! token, and adapts channel events into SSE frames. Dropping the response
//! stream (client disconnect) drops the token guard, which cancels the
//! engine task promptly.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::{self, HeaderName};
use axum::response::sse::{Event, Sse};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::get;
use axum::Router;
use futures_util::stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

use lib_common::tracking::{TrackingEngine, TrackingEvent};

use super::parcels::fetch_owned_parcel;
use crate::parcel_logic::error::AppError;
use crate::parcel_logic::extract::AuthUser;
use crate::parcel_logic::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/parcels/{parcel_id}/stream", get(stream_parcel_updates))
}

fn sse_frame(event: TrackingEvent) -> Event {
    match event {
        TrackingEvent::Data(payload) => Event::default()
            .data(serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string())),
        TrackingEvent::Keepalive => Event::default().comment("keepalive"),
        TrackingEvent::End => Event::default().event("end").data("{}"),
    }
}

async fn stream_parcel_updates(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(parcel_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    // Ownership is checked once, before the stream starts; the engine then
    // re-reads only tracking state each cycle.
    fetch_owned_parcel(&state, parcel_id, user).await?;

    let engine = TrackingEngine::new(
        state.parcels.clone(),
        state.geo.clone(),
        state.stream_poll_interval,
    );

    let (tx, rx) = mpsc::channel::<TrackingEvent>(16);
    let token = CancellationToken::new();
    tokio::spawn(engine.run(parcel_id, tx, token.child_token()));
    debug!("tracking stream opened for parcel {parcel_id} by user {}", user.id);

    // The guard travels inside the stream state. When the client disconnects
    // axum drops the stream, the guard cancels the token, and the engine
    // task exits on its next select point.
    let guard = token.drop_guard();
    let events = stream::unfold(
        (rx, guard),
        |(mut rx, guard): (mpsc::Receiver<TrackingEvent>, DropGuard)| async move {
            let event = rx.recv().await?;
            Some((Ok::<Event, Infallible>(sse_frame(event)), (rx, guard)))
        },
    );

    Ok((
        AppendHeaders([
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ]),
        Sse::new(events),
    ))
}
