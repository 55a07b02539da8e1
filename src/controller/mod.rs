//! # Controller Module
//!
//! Joystick input handling.
//!
//! This module handles:
//! - The [`InputDevice`] seam the scheduler polls
//! - Joystick detection and axis reading via evdev
//! - Mapping raw axis samples onto RC channels

pub mod axis;
pub mod device;
pub mod joystick;

pub use axis::{axis_to_us, InputMapper};
pub use device::InputDevice;
