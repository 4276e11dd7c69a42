pub mod config;
pub mod downstream;
pub mod model;
pub mod state;
