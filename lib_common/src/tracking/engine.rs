//! # Tracking Engine
//!
//! The polling loop that drives one tracking stream. Each cycle performs a
//! short, bounded sequence: fresh storage read, optional geocoding, optional
//! routing, structural comparison, emit. The loop then suspends for the poll
//! interval; that sleep and the cycle itself both race against the
//! connection's cancellation token so a disconnected client is detected
//! promptly rather than on the next emission attempt.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::connections::{DbError, ParcelTracking};
use crate::geo::GeoResolver;

use super::payload::TrackingPayload;
use super::session::StreamSession;
use super::TrackingEvent;

/// Seam for the per-cycle storage read. The production implementation is
/// [`crate::connections::ParcelStore`]; tests substitute counting doubles.
#[allow(async_fn_in_trait)]
pub trait ParcelSource {
    /// Fresh read of the tracking-relevant parcel state. `Ok(None)` means
    /// the parcel no longer exists.
    async fn fetch_tracking(&self, parcel_id: i32) -> Result<Option<ParcelTracking>, DbError>;
}

impl ParcelSource for crate::connections::ParcelStore {
    async fn fetch_tracking(&self, parcel_id: i32) -> Result<Option<ParcelTracking>, DbError> {
        // Inherent method on the store; resolution prefers it over this impl.
        crate::connections::ParcelStore::fetch_tracking(self, parcel_id).await
    }
}

/// # Tracking Engine
///
/// One engine value drives one connection. `geo` is `None` when no provider
/// key is configured; payloads then degrade to status + location only.
pub struct TrackingEngine<S, G> {
    source: S,
    geo: Option<G>,
    poll_interval: Duration,
}

impl<S: ParcelSource, G: GeoResolver> TrackingEngine<S, G> {
    pub fn new(source: S, geo: Option<G>, poll_interval: Duration) -> Self {
        Self {
            source,
            geo,
            poll_interval,
        }
    }

    /// Runs one poll cycle and returns the event it produced.
    ///
    /// ## Workflow:
    /// 1. Fresh read of the parcel; absence ends the stream.
    /// 2. Base payload from status + present location.
    /// 3. Geocode the present location (when set and a provider exists).
    /// 4. Resolve the destination's coordinates, reusing the session cache
    ///    unless the destination string changed, then merge route details.
    /// 5. Compare against the last emitted payload.
    pub async fn cycle(&self, parcel_id: i32, session: &mut StreamSession) -> TrackingEvent {
        let parcel = match self.source.fetch_tracking(parcel_id).await {
            Ok(Some(parcel)) => parcel,
            Ok(None) => return TrackingEvent::End,
            Err(e) => {
                // A storage hiccup is not "parcel gone"; hold position and
                // let the next cycle retry.
                warn!("tracking read for parcel {parcel_id} failed: {e}");
                return TrackingEvent::Keepalive;
            }
        };

        let mut payload = TrackingPayload::new(parcel.status, parcel.present_location);

        if let Some(geo) = &self.geo {
            if let Some(location) = payload
                .present_location
                .clone()
                .filter(|l| !l.is_empty())
            {
                payload.current_coordinates = geo.geocode(&location).await;

                if let Some(destination) = parcel.destination.filter(|d| !d.is_empty()) {
                    if session.last_destination.as_deref() != Some(destination.as_str()) {
                        session.destination_coords = geo.geocode(&destination).await;
                        session.last_destination = Some(destination);
                    }
                    if let (Some(current), Some(dest)) =
                        (payload.current_coordinates, session.destination_coords)
                    {
                        if let Some(route) = geo.route(current, dest).await {
                            payload.distance_km = Some(route.distance_km);
                            payload.eta_minutes = Some(route.eta_minutes);
                        }
                    }
                }
            }
        }

        if session.last_payload.as_ref() == Some(&payload) {
            TrackingEvent::Keepalive
        } else {
            session.last_payload = Some(payload.clone());
            TrackingEvent::Data(payload)
        }
    }

    /// # Main Execution Loop
    ///
    /// Long-running task for one connection. Emits events over `tx` in
    /// strict cycle order and terminates when:
    /// - the parcel disappears (after emitting exactly one `End` event),
    /// - the receiver is dropped (client went away), or
    /// - `token` is cancelled (server-side disconnect detection).
    pub async fn run(
        self,
        parcel_id: i32,
        tx: mpsc::Sender<TrackingEvent>,
        token: CancellationToken,
    ) {
        let mut session = StreamSession::default();

        loop {
            // Race the cycle against cancellation so a closed connection
            // does not keep spending provider quota on a doomed payload.
            let event = tokio::select! {
                _ = token.cancelled() => break,
                event = self.cycle(parcel_id, &mut session) => event,
            };

            let terminal = matches!(event, TrackingEvent::End);
            if tx.send(event).await.is_err() {
                debug!("tracking client for parcel {parcel_id} went away");
                break;
            }
            if terminal {
                break;
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
