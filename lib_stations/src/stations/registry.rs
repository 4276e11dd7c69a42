//! # Station Registry
//!
//! Owns the station list. Callers get clones, never references into the list,
//! and the only write is `mutate_random_one`, which flips a single status under
//! the write lock.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use thiserror::Error;

use super::model::{Station, StationStatus};
use crate::geo::Location;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate station id: {0}")]
    DuplicateId(String),

    #[error("failed to read stations file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stations file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Chooses which station the next update flips.
///
/// Any `rand` generator works; tests plug in fixed sequences.
pub trait StationPicker: Send {
    /// Returns an index in `0..len`. Never called with `len == 0`.
    fn pick(&mut self, len: usize) -> usize;
}

impl<R: RngCore + Send> StationPicker for R {
    fn pick(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

pub struct StationRegistry {
    stations: RwLock<Vec<Station>>,
    picker: Mutex<Box<dyn StationPicker>>,
}

impl StationRegistry {
    /// Builds a registry over `stations`, rejecting duplicate ids.
    pub fn new(
        stations: Vec<Station>,
        picker: Box<dyn StationPicker>,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(stations.len());
        for station in &stations {
            if !seen.insert(station.id.as_str()) {
                return Err(RegistryError::DuplicateId(station.id.clone()));
            }
        }

        Ok(Self {
            stations: RwLock::new(stations),
            picker: Mutex::new(picker),
        })
    }

    /// Registry over `stations` with an OS-seeded generator.
    pub fn with_stations(stations: Vec<Station>) -> Result<Self, RegistryError> {
        Self::new(stations, Box::new(StdRng::from_os_rng()))
    }

    /// Current stations, in registry order.
    pub fn list(&self) -> Vec<Station> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Station> {
        self.read().iter().find(|s| s.id == id).cloned()
    }

    /// Stations no farther than `radius_km` from `center`, in registry order.
    pub fn filter_within_radius(&self, center: Location, radius_km: f64) -> Vec<Station> {
        self.read()
            .iter()
            .filter(|station| station.distance_from(center) <= radius_km)
            .cloned()
            .collect()
    }

    /// Flips the status of one uniformly chosen station and returns it.
    ///
    /// Returns `None` when the registry is empty.
    pub fn mutate_random_one(&self) -> Option<Station> {
        let mut picker = self.picker.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stations = self.stations.write().unwrap_or_else(PoisonError::into_inner);
        if stations.is_empty() {
            return None;
        }

        let index = picker.pick(stations.len()) % stations.len();
        let station = &mut stations[index];
        station.status = station.status.flipped();
        log::debug!("Station {} is now {}", station.id, station.status);
        Some(station.clone())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Station>> {
        // A panic elsewhere cannot leave a half-written status, so a poisoned lock is still usable.
        self.stations.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The mock stations around Kerala the server starts with.
pub fn seed_stations() -> Vec<Station> {
    vec![
        Station::new("1", 8.48, 76.95, StationStatus::Busy),
        Station::new("2", 8.89, 76.61, StationStatus::Available),
        Station::new("3", 9.9770, 76.2910, StationStatus::Busy),
        Station::new("4", 10.51, 76.21, StationStatus::Available),
        Station::new("5", 11.25, 75.78, StationStatus::Busy),
        Station::new("6", 8.5283, 77.0543, StationStatus::Available),
    ]
}

/// Reads a JSON array of stations.
pub fn load_stations_file(path: &Path) -> Result<Vec<Station>, RegistryError> {
    let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| RegistryError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::haversine_km;
    use std::collections::VecDeque;
    use std::io::Write;

    /// Replays a fixed list of indices.
    struct Sequence(VecDeque<usize>);

    impl StationPicker for Sequence {
        fn pick(&mut self, _len: usize) -> usize {
            self.0.pop_front().expect("sequence exhausted")
        }
    }

    fn registry_with(indices: &[usize]) -> StationRegistry {
        StationRegistry::new(seed_stations(), Box::new(Sequence(indices.iter().copied().collect())))
            .unwrap()
    }

    fn kuttichal() -> Location {
        Location::new(8.5283, 77.0543).unwrap()
    }

    #[test]
    fn list_returns_seed_in_order() {
        let registry = registry_with(&[]);
        let ids: Vec<_> = registry.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5", "6"]);
        assert_eq!(registry.len(), 6);
        assert!(!registry.is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let stations = vec![
            Station::new("a", 0.0, 0.0, StationStatus::Busy),
            Station::new("a", 1.0, 1.0, StationStatus::Available),
        ];
        let err = StationRegistry::with_stations(stations).err().unwrap();
        assert!(matches!(err, RegistryError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn filter_matches_distance_predicate_exactly() {
        let registry = registry_with(&[]);
        let centers = [kuttichal(), Location::new(10.0, 76.3).unwrap(), Location::new(0.0, 0.0).unwrap()];
        for center in centers {
            for radius in [0.0, 15.0, 100.0, 300.0, 1000.0] {
                let expected: Vec<_> = registry
                    .list()
                    .into_iter()
                    .filter(|s| haversine_km(center.lat, center.lng, s.lat, s.lng) <= radius)
                    .collect();
                assert_eq!(registry.filter_within_radius(center, radius), expected);
            }
        }
    }

    #[test]
    fn kerala_scenario_at_policy_radius() {
        let registry = StationRegistry::with_stations(vec![
            Station::new("tvm", 8.48, 76.95, StationStatus::Available),
            Station::new("kzd", 11.25, 75.78, StationStatus::Busy),
        ])
        .unwrap();

        let nearby = registry.filter_within_radius(kuttichal(), crate::stations::RADIUS_POLICY_KM);
        let ids: Vec<_> = nearby.iter().map(|s| s.id.as_str()).collect();
        // Kozhikode is ~333 km away by haversine, just past the policy radius.
        assert_eq!(ids, ["tvm"]);

        let wider = registry.filter_within_radius(kuttichal(), 340.0);
        assert_eq!(wider.len(), 2);
    }

    #[test]
    fn zero_radius_keeps_colocated_station() {
        let registry = registry_with(&[]);
        let nearby = registry.filter_within_radius(kuttichal(), 0.0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].id, "6");
    }

    #[test]
    fn mutation_flips_the_picked_station_only() {
        let registry = registry_with(&[2, 2, 5]);
        let before = registry.list();

        let flipped = registry.mutate_random_one().unwrap();
        assert_eq!(flipped.id, "3");
        assert_eq!(flipped.status, StationStatus::Available);
        assert_eq!(registry.get("3").unwrap().status, StationStatus::Available);
        for (old, new) in before.iter().zip(registry.list()) {
            if old.id != "3" {
                assert_eq!(*old, new);
            }
        }

        registry.mutate_random_one();
        assert_eq!(registry.get("3").unwrap().status, StationStatus::Busy);

        registry.mutate_random_one();
        assert_eq!(registry.get("6").unwrap().status, StationStatus::Busy);
    }

    #[test]
    fn mutation_preserves_count_and_status_domain() {
        let registry = StationRegistry::new(seed_stations(), Box::new(StdRng::seed_from_u64(7))).unwrap();
        for _ in 0..500 {
            registry.mutate_random_one();
            let stations = registry.list();
            assert_eq!(stations.len(), 6);
            assert!(stations
                .iter()
                .all(|s| matches!(s.status, StationStatus::Available | StationStatus::Busy)));
        }
    }

    #[test]
    fn mutation_on_empty_registry_is_none() {
        let registry = StationRegistry::with_stations(Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.mutate_random_one().is_none());
    }

    #[test]
    fn concurrent_readers_never_see_a_missing_station() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(
            StationRegistry::new(seed_stations(), Box::new(StdRng::seed_from_u64(42))).unwrap(),
        );
        let writer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..2_000 {
                    registry.mutate_random_one();
                }
            })
        };
        for _ in 0..2_000 {
            assert_eq!(registry.filter_within_radius(kuttichal(), 10_000.0).len(), 6);
        }
        writer.join().unwrap();
    }

    #[test]
    fn stations_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"x","lat":1.5,"lng":2.5,"status":"available"}},{{"id":"y","lat":-3.0,"lng":4.0,"status":"busy"}}]"#
        )
        .unwrap();

        let stations = load_stations_file(file.path()).unwrap();
        assert_eq!(
            stations,
            vec![
                Station::new("x", 1.5, 2.5, StationStatus::Available),
                Station::new("y", -3.0, 4.0, StationStatus::Busy),
            ]
        );
    }

    #[test]
    fn stations_file_errors() {
        let missing = load_stations_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(missing, RegistryError::Io { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let bad = load_stations_file(file.path()).unwrap_err();
        assert!(matches!(bad, RegistryError::Parse { .. }));
    }
}
