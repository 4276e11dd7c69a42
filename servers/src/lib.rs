//! Shared pieces of the server binaries, exposed so integration tests can
//! drive the router directly.

pub mod stations_logic;
