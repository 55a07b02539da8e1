//! # Telemetry Module
//!
//! Publishes live uplink telemetry for external processes.
//!
//! This module handles:
//! - Sampling link, channel, GPS, battery and attitude state from the transport
//! - Encoding it as a fixed-layout binary record
//! - Replacing the published record atomically at ~50Hz

pub mod record;
pub mod sink;
pub mod snapshotter;

pub use record::{TelemetryRecord, TELEMETRY_RECORD_SIZE};
pub use sink::{FileTelemetrySink, TelemetrySink};
pub use snapshotter::TelemetrySnapshotter;
