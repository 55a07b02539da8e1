//! # Error Types
//!
//! Custom error types for RC Ground Link using `thiserror`.

use thiserror::Error;

/// Main error type for RC Ground Link
#[derive(Debug, Error)]
pub enum GroundLinkError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Telemetry record encoding/decoding errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Input device errors (open or poll failures)
    #[error("Input device error: {0}")]
    InputDevice(String),

    /// No usable joystick was found
    #[error("No joystick input device found")]
    InputDeviceNotFound,
}

/// Result type alias for RC Ground Link
pub type Result<T> = std::result::Result<T, GroundLinkError>;
