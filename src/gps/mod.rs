// src/gps/mod.rs
//! GPS device polling and data handling

pub mod data;
pub mod poller;

pub use data::{parse_gps_payload, GpsData, GpsReading};
pub use poller::{GpsPoller, PollSettings};
