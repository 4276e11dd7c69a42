//! # Session Hub
//!
//! Maps `ClientId -> Session` and turns session events into snapshots.
//! The map lock is never held while the registry is read or mutated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;

use super::session::{ClientId, Session, SessionState};
use super::{Snapshot, SnapshotKind};
use crate::geo::{Location, LocationError};
use crate::stations::{build_snapshot, HourSource, LocalClock, StationRegistry, RADIUS_POLICY_KM};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("invalid location: {0}")]
    InvalidLocation(#[from] LocationError),

    #[error("no live session with id {0}")]
    UnknownSession(ClientId),
}

pub struct SessionHub {
    sessions: Mutex<HashMap<ClientId, Session>>,
    next_id: AtomicUsize,
    registry: Arc<StationRegistry>,
    radius_km: f64,
    clock: Arc<dyn HourSource>,
}

impl SessionHub {
    /// Hub over `registry` using the policy radius and the local clock.
    pub fn new(registry: Arc<StationRegistry>) -> Self {
        Self::with_options(registry, RADIUS_POLICY_KM, Arc::new(LocalClock))
    }

    pub fn with_options(
        registry: Arc<StationRegistry>,
        radius_km: f64,
        clock: Arc<dyn HourSource>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            registry,
            radius_km,
            clock,
        }
    }

    pub fn registry(&self) -> &Arc<StationRegistry> {
        &self.registry
    }

    /// Opens an `Unbound` session and returns its id.
    pub fn connect(&self) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions().insert(id, Session::new(id));
        log::info!("Client {} connected", id);
        id
    }

    /// Validates `payload` and binds the session to it.
    ///
    /// On success the session is `Bound` and the caller gets the initial
    /// snapshot to push. On error nothing changes.
    pub fn report_location(&self, id: ClientId, payload: &Value) -> Result<Snapshot, SessionError> {
        let location = match Location::from_payload(payload) {
            Ok(location) => location,
            Err(e) => {
                log::warn!("Client {} sent an invalid location {}: {}", id, payload, e);
                return Err(e.into());
            }
        };

        {
            let mut sessions = self.sessions();
            let session = sessions
                .get_mut(&id)
                .filter(|s| !s.is_closed())
                .ok_or(SessionError::UnknownSession(id))?;
            session.bind(location);
        }
        log::info!("Client {} sent location ({}, {})", id, location.lat, location.lng);

        Ok(self.snapshot(SnapshotKind::Initial, location))
    }

    /// One timer firing for session `id`.
    ///
    /// Only `Bound` sessions get an update: the registry flips one station and
    /// the session receives its refreshed view. Unbound, closed or unknown
    /// sessions yield `None` and leave the registry alone.
    pub fn tick(&self, id: ClientId) -> Option<Snapshot> {
        let location = self.sessions().get(&id).and_then(Session::location)?;

        if let Some(station) = self.registry.mutate_random_one() {
            log::debug!("Tick for client {} flipped station {} to {}", id, station.id, station.status);
        }
        Some(self.snapshot(SnapshotKind::Update, location))
    }

    /// Closes and forgets the session. Returns it in its `Closed` state.
    pub fn disconnect(&self, id: ClientId) -> Option<Session> {
        let mut session = self.sessions().remove(&id)?;
        session.close();
        log::info!("Client {} disconnected", id);
        Some(session)
    }

    pub fn session_state(&self, id: ClientId) -> Option<SessionState> {
        self.sessions().get(&id).map(Session::state)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions().len()
    }

    fn snapshot(&self, kind: SnapshotKind, center: Location) -> Snapshot {
        Snapshot {
            kind,
            stations: build_snapshot(&self.registry, center, self.radius_km, self.clock.wait_time()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<ClientId, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::{seed_stations, FixedHour, StationPicker, StationStatus, WaitTime};
    use serde_json::json;

    /// Always flips the same station.
    struct Always(usize);

    impl StationPicker for Always {
        fn pick(&mut self, _len: usize) -> usize {
            self.0
        }
    }

    fn hub(hour: u32) -> SessionHub {
        let registry = StationRegistry::new(seed_stations(), Box::new(Always(0))).unwrap();
        SessionHub::with_options(Arc::new(registry), RADIUS_POLICY_KM, Arc::new(FixedHour(hour)))
    }

    fn kuttichal() -> Value {
        json!({"lat": 8.5283, "lng": 77.0543})
    }

    #[test]
    fn connect_hands_out_distinct_ids() {
        let hub = hub(12);
        let a = hub.connect();
        let b = hub.connect();
        assert_ne!(a, b);
        assert_eq!(hub.active_sessions(), 2);
        assert_eq!(hub.session_state(a), Some(SessionState::Unbound));
    }

    #[test]
    fn unbound_session_never_gets_updates() {
        let hub = hub(12);
        let id = hub.connect();
        let before = hub.registry().list();

        for _ in 0..10 {
            assert!(hub.tick(id).is_none());
        }
        assert_eq!(hub.registry().list(), before);
    }

    #[test]
    fn location_report_binds_and_returns_initial_snapshot() {
        let hub = hub(9);
        let id = hub.connect();

        let snapshot = hub.report_location(id, &kuttichal()).unwrap();
        assert_eq!(snapshot.kind, SnapshotKind::Initial);
        assert_eq!(snapshot.kind.event_name(), "initial_stations");
        let ids: Vec<_> = snapshot.stations.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "6"]);
        assert!(snapshot.stations.iter().all(|s| s.wait_time == WaitTime::Peak));
        assert_eq!(
            hub.session_state(id),
            Some(SessionState::Bound(Location::new(8.5283, 77.0543).unwrap()))
        );
    }

    #[test]
    fn tick_after_bind_mutates_and_updates() {
        let hub = hub(3);
        let id = hub.connect();
        let initial = hub.report_location(id, &kuttichal()).unwrap();
        assert_eq!(initial.stations[0].status, StationStatus::Busy);

        let update = hub.tick(id).unwrap();
        assert_eq!(update.kind, SnapshotKind::Update);
        assert_eq!(update.kind.event_name(), "station_update");
        assert_eq!(update.stations[0].status, StationStatus::Available);
        assert!(update.stations.iter().all(|s| s.wait_time == WaitTime::Short));
    }

    #[test]
    fn invalid_location_leaves_state_untouched() {
        let hub = hub(12);
        let id = hub.connect();

        let err = hub.report_location(id, &json!({"lat": "north", "lng": 1.0})).unwrap_err();
        assert!(matches!(err, SessionError::InvalidLocation(LocationError::NotANumber { .. })));
        assert_eq!(hub.session_state(id), Some(SessionState::Unbound));

        hub.report_location(id, &kuttichal()).unwrap();
        let err = hub.report_location(id, &json!({"lng": 1.0})).unwrap_err();
        assert_eq!(err, SessionError::InvalidLocation(LocationError::MissingField("lat")));
        assert_eq!(
            hub.session_state(id),
            Some(SessionState::Bound(Location::new(8.5283, 77.0543).unwrap()))
        );
    }

    #[test]
    fn new_location_overwrites_previous() {
        let hub = hub(12);
        let id = hub.connect();
        hub.report_location(id, &kuttichal()).unwrap();

        let london = hub.report_location(id, &json!({"lat": 51.5, "lng": -0.12})).unwrap();
        assert!(london.stations.is_empty());
        assert!(hub.tick(id).unwrap().stations.is_empty());
    }

    #[test]
    fn disconnect_without_location_then_tick_is_harmless() {
        let hub = hub(12);
        let id = hub.connect();

        let closed = hub.disconnect(id).unwrap();
        assert!(closed.is_closed());
        assert_eq!(hub.session_state(id), None);
        assert_eq!(hub.active_sessions(), 0);

        assert!(hub.tick(id).is_none());
        assert!(hub.disconnect(id).is_none());
        assert_eq!(
            hub.report_location(id, &kuttichal()),
            Err(SessionError::UnknownSession(id))
        );
    }

    #[test]
    fn sessions_do_not_see_each_others_location() {
        let hub = hub(12);
        let near = hub.connect();
        let far = hub.connect();
        hub.report_location(near, &kuttichal()).unwrap();
        hub.report_location(far, &json!({"lat": -33.86, "lng": 151.2})).unwrap();

        assert_eq!(hub.tick(near).unwrap().stations.len(), 5);
        assert!(hub.tick(far).unwrap().stations.is_empty());

        hub.disconnect(far);
        assert_eq!(hub.tick(near).unwrap().stations.len(), 5);
    }

    #[test]
    fn registry_mutations_are_shared_across_sessions() {
        let hub = hub(12);
        let a = hub.connect();
        let b = hub.connect();
        hub.report_location(a, &kuttichal()).unwrap();
        hub.report_location(b, &kuttichal()).unwrap();

        // Station "1" flips on every tick, whichever session fires.
        assert_eq!(hub.tick(a).unwrap().stations[0].status, StationStatus::Available);
        assert_eq!(hub.tick(b).unwrap().stations[0].status, StationStatus::Busy);
    }
}
