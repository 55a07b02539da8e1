//! # RC Ground Link Library
//!
//! Control core of a CRSF ground station.
//!
//! This library keeps the 16 RC channels in a shared [`channels::ChannelStore`],
//! feeds it from a line-based command file and an optional joystick, pushes the
//! channels to the downlink [`transport::Transport`] at a bounded rate and
//! publishes a fixed-layout telemetry record for external readers.

pub mod channels;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod scheduler;
pub mod telemetry;
pub mod transport;
