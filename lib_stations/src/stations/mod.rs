//! # Stations
//!
//! The station data model and everything that reads or changes it.
//!
//! - **`model`**: `Station`, `StationStatus` and the transient
//!   `AnnotatedStation` sent to clients.
//! - **`registry`**: `StationRegistry`, the single owner and mutator of the
//!   station list. Reads hand out copies; the random status flip takes the write
//!   lock so no reader ever observes a half-applied change.
//! - **`wait_time`**: the time-of-day wait label and the clock it reads.
//! - **`snapshot`**: filter + annotate, the payload of every push.

pub mod model;
pub mod registry;
pub mod snapshot;
pub mod wait_time;

pub use model::{AnnotatedStation, Station, StationStatus};
pub use registry::{load_stations_file, seed_stations, RegistryError, StationPicker, StationRegistry};
pub use snapshot::build_snapshot;
pub use wait_time::{current_wait_time, wait_time_for_hour, FixedHour, HourSource, LocalClock, WaitTime};

/// Stations farther than this from the client are not sent.
pub const RADIUS_POLICY_KM: f64 = 300.0;
