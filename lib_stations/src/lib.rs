//! # lib_stations
//!
//! Building blocks for the charging-station stream server. Every folder is a
//! module gated behind a cargo feature of the same name, so a consumer only
//! compiles what it uses. The `servers` crate enables `full`.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Great-circle distance and validated client locations.
#[cfg(feature = "stations")]
pub mod geo;
/// Station records, the registry, wait-time estimation and snapshots.
#[cfg(feature = "stations")]
pub mod stations;
/// Subscription sessions and the hub that owns them.
#[cfg(feature = "sessions")]
pub mod sessions;
/// Conversation history and the generative-AI proxy client.
#[cfg(feature = "chat")]
pub mod chat;
/// Generic HTTP API client with retry middleware.
#[cfg(feature = "retrieve")]
pub mod retrieve;
/// fern based log setup with file rotation.
#[cfg(feature = "loggers")]
pub mod loggers;

#[cfg(feature = "stations")]
pub use geo::{distance_km, haversine_km, Location, LocationError};
#[cfg(feature = "stations")]
pub use stations::{
    AnnotatedStation, Station, StationPicker, StationRegistry, StationStatus, WaitTime,
    RADIUS_POLICY_KM,
};
#[cfg(feature = "sessions")]
pub use sessions::{ClientId, SessionHub, SessionState};
