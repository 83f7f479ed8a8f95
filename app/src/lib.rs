//! Client core for the Wild Robot academy application.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the optimistic
//! mutation controller, the attendance roster service, access gating and
//! schedule generation, while [`outbound`] adapts the hosted backend's REST
//! gateway and realtime payloads to the domain ports.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

pub use config::BackendSettings;
