use super::model::AnnotatedStation;
use super::registry::StationRegistry;
use super::wait_time::WaitTime;
use crate::geo::Location;

/// Stations within `radius_km` of `center`, each labelled with `wait_time`.
pub fn build_snapshot(
    registry: &StationRegistry,
    center: Location,
    radius_km: f64,
    wait_time: WaitTime,
) -> Vec<AnnotatedStation> {
    registry
        .filter_within_radius(center, radius_km)
        .into_iter()
        .map(|station| station.annotate(wait_time))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::{seed_stations, RADIUS_POLICY_KM};

    #[test]
    fn snapshot_is_filtered_and_labelled() {
        let registry = StationRegistry::with_stations(seed_stations()).unwrap();
        let center = Location::new(8.5283, 77.0543).unwrap();

        let snapshot = build_snapshot(&registry, center, RADIUS_POLICY_KM, WaitTime::Peak);
        let ids: Vec<_> = snapshot.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "6"]);
        assert!(snapshot.iter().all(|s| s.wait_time == WaitTime::Peak));

        let far_away = Location::new(51.5, -0.12).unwrap();
        assert!(build_snapshot(&registry, far_away, RADIUS_POLICY_KM, WaitTime::Short).is_empty());
    }
}
