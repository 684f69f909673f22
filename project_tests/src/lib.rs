//! Shared test doubles for the tracking-engine integration tests: a
//! scripted parcel source and a counting geo resolver. Both count their
//! calls so tests can assert on caching behavior, not just outputs.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lib_common::connections::{DbError, ParcelTracking};
use lib_common::geo::{Coordinates, GeoResolver, RouteDetails};
use lib_common::tracking::ParcelSource;

/// One scripted outcome of a tracking read.
#[derive(Debug, Clone)]
pub enum Step {
    Row(ParcelTracking),
    Missing,
    Fail,
}

/// Convenience constructor for scripted rows.
pub fn row(status: &str, present_location: Option<&str>, destination: Option<&str>) -> Step {
    Step::Row(ParcelTracking {
        status: status.to_string(),
        present_location: present_location.map(str::to_string),
        destination: destination.map(str::to_string),
    })
}

/// A parcel source that replays a fixed script. Once the script runs out,
/// the final step repeats, so a stream can idle on stable state.
#[derive(Clone)]
pub struct ScriptedParcels {
    steps: Arc<Mutex<VecDeque<Step>>>,
    last: Arc<Mutex<Option<Step>>>,
    pub reads: Arc<AtomicUsize>,
}

impl ScriptedParcels {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            last: Arc::new(Mutex::new(None)),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(step) = steps.pop_front() {
            *last = Some(step.clone());
        }
        last.clone().unwrap_or(Step::Missing)
    }
}

impl ParcelSource for ScriptedParcels {
    async fn fetch_tracking(&self, _parcel_id: i32) -> Result<Option<ParcelTracking>, DbError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Row(row) => Ok(Some(row)),
            Step::Missing => Ok(None),
            Step::Fail => Err(DbError::QueryError("scripted failure".to_string())),
        }
    }
}

/// A geo resolver backed by a fixed location table. Unknown locations
/// resolve to `None`, mimicking a provider miss.
#[derive(Clone, Default)]
pub struct FakeGeo {
    coords: HashMap<String, Coordinates>,
    route: Option<RouteDetails>,
    pub geocode_calls: Arc<AtomicUsize>,
    pub route_calls: Arc<AtomicUsize>,
}

impl FakeGeo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, name: &str, lat: f64, lon: f64) -> Self {
        self.coords.insert(name.to_string(), Coordinates { lat, lon });
        self
    }

    pub fn with_route(mut self, distance_km: f64, eta_minutes: i64) -> Self {
        self.route = Some(RouteDetails {
            distance_km,
            eta_minutes,
        });
        self
    }
}

impl GeoResolver for FakeGeo {
    async fn geocode(&self, location: &str) -> Option<Coordinates> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        self.coords.get(location).copied()
    }

    async fn route(&self, _origin: Coordinates, _dest: Coordinates) -> Option<RouteDetails> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        self.route
    }
}
