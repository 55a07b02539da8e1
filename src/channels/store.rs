//! Mutex-guarded store of the 16 RC channel values.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{initial_channels, is_valid_channel, is_valid_value, ChannelSet};

/// Thread-safe store of the current RC channel values.
///
/// Both the command parser and the joystick mapper write here, the scheduler
/// reads a full snapshot before every send. A single lock guards the array and
/// is held only for one array operation.
///
/// Writes outside `1..=16` or outside `1000..=2000` are dropped without
/// touching the stored values.
///
/// # Examples
///
/// ```
/// use rc_groundlink::channels::ChannelStore;
///
/// let store = ChannelStore::new();
/// assert_eq!(store.get(3), Some(1000)); // Throttle starts low
///
/// store.set_channel(1, 1200);
/// store.set_channel(1, 2500); // rejected
/// assert_eq!(store.snapshot()[0], 1200);
/// ```
#[derive(Debug)]
pub struct ChannelStore {
    values: Mutex<ChannelSet>,
}

impl Default for ChannelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelStore {
    /// Creates a store with all channels centered and throttle at failsafe-low.
    #[must_use]
    pub fn new() -> Self {
        Self::with_values(initial_channels())
    }

    /// Creates a store preloaded with `values`.
    ///
    /// Values are taken as-is; callers are expected to pass a valid set.
    #[must_use]
    pub fn with_values(values: ChannelSet) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    /// Returns a consistent copy of all 16 channels.
    #[must_use]
    pub fn snapshot(&self) -> ChannelSet {
        *self.lock()
    }

    /// Returns a single channel value (1-based), or `None` for an invalid index.
    #[must_use]
    pub fn get(&self, channel: usize) -> Option<u16> {
        if !is_valid_channel(channel) {
            return None;
        }
        Some(self.lock()[channel - 1])
    }

    /// Sets one channel (1-based).
    ///
    /// Returns `true` if the write was applied. Invalid channel numbers and
    /// out-of-range values leave the store untouched.
    pub fn set_channel(&self, channel: usize, value: i32) -> bool {
        if !is_valid_channel(channel) || !is_valid_value(value) {
            return false;
        }
        // Range-checked above
        let value = value as u16;
        self.lock()[channel - 1] = value;
        true
    }

    // A panicking writer cannot leave the array half-written (single element
    // stores), so a poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, ChannelSet> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
