//! Lifecycle of the per-connection engine task: terminal events, client
//! disconnects, and cancellation.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use lib_common::tracking::{TrackingEngine, TrackingEvent};

use project_tests::{row, FakeGeo, ScriptedParcels, Step};

const POLL: Duration = Duration::from_millis(5);
const WAIT: Duration = Duration::from_secs(2);

fn engine(source: ScriptedParcels) -> TrackingEngine<ScriptedParcels, FakeGeo> {
    TrackingEngine::new(source, None, POLL)
}

#[tokio::test]
async fn vanished_parcel_ends_stream_exactly_once() {
    let source = ScriptedParcels::new(vec![row("In Transit", None, None), Step::Missing]);
    let (tx, mut rx) = mpsc::channel(16);
    let token = CancellationToken::new();
    let task = tokio::spawn(engine(source).run(7, tx, token));

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    timeout(WAIT, task).await.expect("task should stop").unwrap();

    assert!(matches!(events[0], TrackingEvent::Data(_)));
    let ends = events
        .iter()
        .filter(|e| matches!(e, TrackingEvent::End))
        .count();
    assert_eq!(ends, 1);
    assert!(matches!(events.last(), Some(TrackingEvent::End)));
}

#[tokio::test]
async fn cancellation_stops_the_loop() {
    // Stable state, so the loop would otherwise run forever.
    let source = ScriptedParcels::new(vec![row("Pending", None, None)]);
    let reads = source.reads.clone();
    let (tx, mut rx) = mpsc::channel(16);
    let token = CancellationToken::new();
    let task = tokio::spawn(engine(source).run(7, tx, token.clone()));

    // Let a few cycles go by, then cancel mid-stream.
    assert!(rx.recv().await.is_some());
    token.cancel();

    timeout(WAIT, task).await.expect("task should stop").unwrap();
    let reads_at_stop = reads.load(std::sync::atomic::Ordering::SeqCst);

    // No more cycles run after cancellation.
    tokio::time::sleep(POLL * 10).await;
    assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), reads_at_stop);
}

#[tokio::test]
async fn dropped_receiver_stops_the_loop() {
    let source = ScriptedParcels::new(vec![row("Pending", None, None)]);
    let reads = source.reads.clone();
    let (tx, mut rx) = mpsc::channel(16);
    let token = CancellationToken::new();
    let task = tokio::spawn(engine(source).run(7, tx, token));

    assert!(rx.recv().await.is_some());
    drop(rx);

    timeout(WAIT, task).await.expect("task should stop").unwrap();
    let reads_at_stop = reads.load(std::sync::atomic::Ordering::SeqCst);
    tokio::time::sleep(POLL * 10).await;
    assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), reads_at_stop);
}

#[tokio::test]
async fn quiet_stream_emits_keepalives_between_changes() {
    let source = ScriptedParcels::new(vec![
        row("In Transit", Some("Nakuru"), None),
        row("In Transit", Some("Nakuru"), None),
        row("In Transit", Some("Naivasha"), None),
    ]);
    let (tx, mut rx) = mpsc::channel(16);
    let token = CancellationToken::new();
    let task = tokio::spawn(engine(source).run(7, tx, token.clone()));

    let mut events = Vec::new();
    for _ in 0..3 {
        match timeout(WAIT, rx.recv()).await {
            Ok(Some(event)) => events.push(event),
            other => panic!("stream stalled: {other:?}"),
        }
    }
    token.cancel();
    timeout(WAIT, task).await.expect("task should stop").unwrap();

    assert!(matches!(events[0], TrackingEvent::Data(_)));
    assert_eq!(events[1], TrackingEvent::Keepalive);
    let TrackingEvent::Data(third) = &events[2] else {
        panic!("expected a data event for the location change");
    };
    assert_eq!(third.present_location.as_deref(), Some("Naivasha"));
}
