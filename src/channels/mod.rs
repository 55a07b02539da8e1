//! # Channels Module
//!
//! RC channel constants and the shared channel store.
//!
//! ## Channel Assignments
//!
//! | Channel | Function | Initial value |
//! |---------|----------|---------------|
//! | CH1 | Roll | 1500 |
//! | CH2 | Pitch | 1500 |
//! | CH3 | Throttle | 1000 (failsafe-low) |
//! | CH4 | Yaw | 1500 |
//! | CH5-CH16 | AUX | 1500 |
//!
//! Channel numbers are 1-based everywhere outside of array indexing.

pub mod store;

pub use store::ChannelStore;

/// Number of RC channels
pub const CHANNEL_COUNT: usize = 16;

/// Channel value range (pulse width in microseconds)
pub const CHANNEL_VALUE_MIN: u16 = 1000;
pub const CHANNEL_VALUE_MAX: u16 = 2000;
pub const CHANNEL_VALUE_CENTER: u16 = 1500;

/// Throttle value applied before any input arrives
pub const THROTTLE_FAILSAFE: u16 = CHANNEL_VALUE_MIN;

/// Snapshot of all 16 channel values
pub type ChannelSet = [u16; CHANNEL_COUNT];

/// 1-based channel numbers for semantic access.
pub mod channel {
    /// Roll
    pub const ROLL: usize = 1;
    /// Pitch
    pub const PITCH: usize = 2;
    /// Throttle
    pub const THROTTLE: usize = 3;
    /// Yaw
    pub const YAW: usize = 4;
}

/// Channel set used at startup: everything centered, throttle low.
#[must_use]
pub fn initial_channels() -> ChannelSet {
    let mut channels = [CHANNEL_VALUE_CENTER; CHANNEL_COUNT];
    channels[channel::THROTTLE - 1] = THROTTLE_FAILSAFE;
    channels
}

/// Returns true if `value` is a storable pulse width.
#[inline]
#[must_use]
pub fn is_valid_value(value: i32) -> bool {
    (i32::from(CHANNEL_VALUE_MIN)..=i32::from(CHANNEL_VALUE_MAX)).contains(&value)
}

/// Returns true if `channel` is a valid 1-based channel number.
#[inline]
#[must_use]
pub fn is_valid_channel(channel: usize) -> bool {
    (1..=CHANNEL_COUNT).contains(&channel)
}
