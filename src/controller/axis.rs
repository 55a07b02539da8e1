//! # Axis Mapper Module
//!
//! Maps joystick axis samples to RC channel pulse widths.
//!
//! ## Axis Assignments
//!
//! | Axis | Channel | Function | Inverted |
//! |------|---------|----------|----------|
//! | 0 | CH4 | Yaw | no |
//! | 1 | CH3 | Throttle | yes |
//! | 2 | CH1 | Roll | no |
//! | 3 | CH2 | Pitch | yes |
//!
//! Throttle and pitch are inverted because joysticks report "stick up" as a
//! negative value while the channels expect "up" to be high.
//!
//! ## Value Ranges
//!
//! - Raw axis input: -32768..=32767 (signed 16-bit)
//! - Channel output: 1000..=2000 µs
//! - Samples with `|v| < 100` snap to exactly 1500
//!
//! ## Usage
//!
//! ```
//! use rc_groundlink::controller::axis_to_us;
//!
//! assert_eq!(axis_to_us(50), 1500);      // Dead-zone
//! assert_eq!(axis_to_us(32767), 1999);
//! assert_eq!(axis_to_us(-32768), 1000);
//! ```

use tracing::trace;

use super::device::InputDevice;
use crate::channels::{
    channel, ChannelStore, CHANNEL_VALUE_CENTER, CHANNEL_VALUE_MAX, CHANNEL_VALUE_MIN,
};

/// Samples with an absolute value below this map to center.
pub const AXIS_DEADZONE: i64 = 100;

/// Full-scale magnitude of a signed 16-bit axis.
pub const AXIS_FULL_SCALE: i64 = 32768;

/// Pulse-width travel from center to either end, in µs.
pub const AXIS_TRAVEL_US: i64 = 500;

/// One joystick axis feeding one RC channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisBinding {
    /// Joystick axis index
    pub axis: usize,
    /// Target channel (1-based)
    pub channel: usize,
    /// Negate the sample before mapping
    pub inverted: bool,
}

/// Fixed joystick-to-channel assignment.
pub const AXIS_BINDINGS: [AxisBinding; 4] = [
    AxisBinding {
        axis: 0,
        channel: channel::YAW,
        inverted: false,
    },
    AxisBinding {
        axis: 1,
        channel: channel::THROTTLE,
        inverted: true,
    },
    AxisBinding {
        axis: 2,
        channel: channel::ROLL,
        inverted: false,
    },
    AxisBinding {
        axis: 3,
        channel: channel::PITCH,
        inverted: true,
    },
];

/// Converts a raw axis sample into a channel pulse width.
///
/// Takes `i32` so that inverting `-32768` yields full positive deflection
/// instead of wrapping.
#[must_use]
pub fn axis_to_us(value: i32) -> u16 {
    let value = i64::from(value);
    if value.abs() < AXIS_DEADZONE {
        return CHANNEL_VALUE_CENTER;
    }

    // Integer division truncates toward zero
    let us = i64::from(CHANNEL_VALUE_CENTER) + value * AXIS_TRAVEL_US / AXIS_FULL_SCALE;
    us.clamp(i64::from(CHANNEL_VALUE_MIN), i64::from(CHANNEL_VALUE_MAX)) as u16
}

/// Writes joystick axes into the channel store.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputMapper;

impl InputMapper {
    /// Creates a mapper using [`AXIS_BINDINGS`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Maps every bound axis the device currently reports into `store`.
    ///
    /// Returns the number of channels written. Axes the device does not
    /// report are skipped and keep their previous channel value.
    pub fn apply(&self, device: &dyn InputDevice, store: &ChannelStore) -> usize {
        let mut written = 0;
        for binding in &AXIS_BINDINGS {
            let Some(raw) = device.axis(binding.axis) else {
                continue;
            };

            let sample = if binding.inverted {
                -i32::from(raw)
            } else {
                i32::from(raw)
            };
            let us = axis_to_us(sample);

            if store.set_channel(binding.channel, i32::from(us)) {
                written += 1;
            }
            trace!("Axis {} ({}) -> CH{} = {}", binding.axis, raw, binding.channel, us);
        }
        written
    }
}
