//! # Subscription Sessions
//!
//! One `Session` per live connection, kept in the `SessionHub` map under the
//! connection's `ClientId`. A session is `Unbound` until the client reports a
//! location, `Bound` afterwards, and `Closed` once the connection is gone, at
//! which point the hub forgets it.
//!
//! The hub never talks to sockets. It returns `Snapshot`s and the connection
//! task decides how to deliver them.

pub mod hub;
pub mod session;

pub use hub::{SessionError, SessionHub};
pub use session::{ClientId, Session, SessionState};

use crate::stations::AnnotatedStation;

/// Why a snapshot was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// Answer to a location report.
    Initial,
    /// Periodic refresh after a registry mutation.
    Update,
}

impl SnapshotKind {
    /// Event name the snapshot travels under.
    pub fn event_name(self) -> &'static str {
        match self {
            SnapshotKind::Initial => "initial_stations",
            SnapshotKind::Update => "station_update",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub kind: SnapshotKind,
    pub stations: Vec<AnnotatedStation>,
}
