//! Cycle-level behavior of the tracking engine: deduplication, geo
//! enrichment, destination-coordinate caching, and terminal handling.

use std::sync::atomic::Ordering;
use std::time::Duration;

use lib_common::tracking::{StreamSession, TrackingEngine, TrackingEvent};

use project_tests::{row, FakeGeo, ScriptedParcels, Step};

const POLL: Duration = Duration::from_millis(5);

fn engine_without_geo(source: ScriptedParcels) -> TrackingEngine<ScriptedParcels, FakeGeo> {
    TrackingEngine::new(source, None, POLL)
}

#[tokio::test]
async fn first_cycle_always_emits_data() {
    let source = ScriptedParcels::new(vec![row("Pending", None, None)]);
    let engine = engine_without_geo(source);
    let mut session = StreamSession::default();

    let event = engine.cycle(1, &mut session).await;
    let TrackingEvent::Data(payload) = event else {
        panic!("expected a data event, got {event:?}");
    };
    assert_eq!(payload.status, "Pending");
    assert_eq!(payload.present_location, None);
}

#[tokio::test]
async fn unchanged_state_produces_keepalive() {
    let source = ScriptedParcels::new(vec![row("In Transit", Some("Depot A"), None)]);
    let engine = engine_without_geo(source);
    let mut session = StreamSession::default();

    assert!(matches!(
        engine.cycle(1, &mut session).await,
        TrackingEvent::Data(_)
    ));
    // Script repeats its last row, so the second cycle sees identical state.
    assert_eq!(engine.cycle(1, &mut session).await, TrackingEvent::Keepalive);
    assert_eq!(engine.cycle(1, &mut session).await, TrackingEvent::Keepalive);
}

#[tokio::test]
async fn status_change_emits_fresh_data() {
    let source = ScriptedParcels::new(vec![
        row("In Transit", Some("Nairobi CBD"), None),
        row("Delivered", Some("Nairobi CBD"), None),
    ]);
    let engine = engine_without_geo(source);
    let mut session = StreamSession::default();

    let TrackingEvent::Data(first) = engine.cycle(1, &mut session).await else {
        panic!("expected data");
    };
    assert_eq!(first.status, "In Transit");

    let TrackingEvent::Data(second) = engine.cycle(1, &mut session).await else {
        panic!("expected data after status change");
    };
    assert_eq!(second.status, "Delivered");
}

#[tokio::test]
async fn missing_parcel_is_terminal() {
    let source = ScriptedParcels::new(vec![Step::Missing]);
    let engine = engine_without_geo(source);
    let mut session = StreamSession::default();

    assert_eq!(engine.cycle(1, &mut session).await, TrackingEvent::End);
}

#[tokio::test]
async fn storage_failure_holds_position_with_keepalive() {
    let source = ScriptedParcels::new(vec![
        row("Pending", None, None),
        Step::Fail,
        row("Pending", None, None),
    ]);
    let engine = engine_without_geo(source);
    let mut session = StreamSession::default();

    assert!(matches!(
        engine.cycle(1, &mut session).await,
        TrackingEvent::Data(_)
    ));
    // A read error is not "parcel gone"; the stream stays open.
    assert_eq!(engine.cycle(1, &mut session).await, TrackingEvent::Keepalive);
    // And the recovered read dedups against the pre-failure payload.
    assert_eq!(engine.cycle(1, &mut session).await, TrackingEvent::Keepalive);
}

#[tokio::test]
async fn enrichment_attaches_coordinates_and_route() {
    let source = ScriptedParcels::new(vec![row("In Transit", Some("Depot A"), Some("Harbor"))]);
    let geo = FakeGeo::new()
        .with_location("Depot A", -1.28, 36.82)
        .with_location("Harbor", -4.05, 39.67)
        .with_route(487.23, 412);
    let engine = TrackingEngine::new(source, Some(geo), POLL);
    let mut session = StreamSession::default();

    let TrackingEvent::Data(payload) = engine.cycle(1, &mut session).await else {
        panic!("expected data");
    };
    let coords = payload.current_coordinates.expect("coordinates expected");
    assert_eq!(coords.lat, -1.28);
    assert_eq!(payload.distance_km, Some(487.23));
    assert_eq!(payload.eta_minutes, Some(412));
}

#[tokio::test]
async fn geocode_miss_degrades_to_base_payload() {
    // The resolver knows no locations, so every lookup misses.
    let source = ScriptedParcels::new(vec![row("In Transit", Some("Depot A"), Some("Harbor"))]);
    let geo = FakeGeo::new().with_route(487.23, 412);
    let engine = TrackingEngine::new(source, Some(geo.clone()), POLL);
    let mut session = StreamSession::default();

    let TrackingEvent::Data(payload) = engine.cycle(1, &mut session).await else {
        panic!("expected data");
    };
    assert_eq!(payload.status, "In Transit");
    assert_eq!(payload.present_location.as_deref(), Some("Depot A"));
    assert_eq!(payload.current_coordinates, None);
    assert_eq!(payload.distance_km, None);
    // A failed current-location geocode also means no routing attempt.
    assert_eq!(geo.route_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn destination_geocode_is_cached_across_cycles() {
    let source = ScriptedParcels::new(vec![
        row("In Transit", Some("Depot A"), Some("Harbor")),
        row("In Transit", Some("Depot B"), Some("Harbor")),
    ]);
    let geo = FakeGeo::new()
        .with_location("Depot A", -1.28, 36.82)
        .with_location("Depot B", -1.30, 36.90)
        .with_location("Harbor", -4.05, 39.67)
        .with_route(480.0, 400);
    let engine = TrackingEngine::new(source, Some(geo.clone()), POLL);
    let mut session = StreamSession::default();

    engine.cycle(1, &mut session).await;
    // First cycle resolves the present location and the destination.
    assert_eq!(geo.geocode_calls.load(Ordering::SeqCst), 2);

    engine.cycle(1, &mut session).await;
    // Second cycle reuses the cached destination coordinates.
    assert_eq!(geo.geocode_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn changed_destination_is_geocoded_again() {
    let source = ScriptedParcels::new(vec![
        row("In Transit", Some("Depot A"), Some("Harbor")),
        row("In Transit", Some("Depot A"), Some("Airport")),
    ]);
    let geo = FakeGeo::new()
        .with_location("Depot A", -1.28, 36.82)
        .with_location("Harbor", -4.05, 39.67)
        .with_location("Airport", -1.32, 36.93)
        .with_route(480.0, 400);
    let engine = TrackingEngine::new(source, Some(geo.clone()), POLL);
    let mut session = StreamSession::default();

    engine.cycle(1, &mut session).await;
    assert_eq!(geo.geocode_calls.load(Ordering::SeqCst), 2);

    engine.cycle(1, &mut session).await;
    // Present location again, plus a fresh destination lookup.
    assert_eq!(geo.geocode_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn empty_present_location_skips_enrichment() {
    let source = ScriptedParcels::new(vec![row("Pending", Some(""), Some("Harbor"))]);
    let geo = FakeGeo::new().with_location("Harbor", -4.05, 39.67);
    let engine = TrackingEngine::new(source, Some(geo.clone()), POLL);
    let mut session = StreamSession::default();

    let TrackingEvent::Data(payload) = engine.cycle(1, &mut session).await else {
        panic!("expected data");
    };
    assert_eq!(payload.current_coordinates, None);
    assert_eq!(geo.geocode_calls.load(Ordering::SeqCst), 0);
}
