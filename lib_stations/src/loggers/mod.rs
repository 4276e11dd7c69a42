/// fern dispatch to stdout plus a per-run log file, with rotation.
pub mod setup;

pub use setup::{parse_level, setup_logging, LoggerError};
