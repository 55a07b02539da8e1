//! Work mode selecting which input drives the channels.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Deserialize;

/// Control source selection.
///
/// Owned by whoever embeds the scheduler; the scheduler only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WorkMode {
    /// Channels come from the command file only
    #[default]
    Manual = 0,
    /// Joystick axes drive CH1-CH4 every tick
    Joystick = 1,
}

impl WorkMode {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkMode::Joystick,
            _ => WorkMode::Manual,
        }
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkMode::Manual => f.write_str("manual"),
            WorkMode::Joystick => f.write_str("joystick"),
        }
    }
}

/// Shared, lock-free handle to the current [`WorkMode`].
///
/// # Examples
///
/// ```
/// use rc_groundlink::scheduler::{ModeSwitch, WorkMode};
///
/// let mode = ModeSwitch::new(WorkMode::Manual);
/// let handle = mode.clone();
/// handle.set(WorkMode::Joystick);
/// assert_eq!(mode.get(), WorkMode::Joystick);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModeSwitch {
    mode: Arc<AtomicU8>,
}

impl ModeSwitch {
    #[must_use]
    pub fn new(mode: WorkMode) -> Self {
        Self {
            mode: Arc::new(AtomicU8::new(mode as u8)),
        }
    }

    #[must_use]
    pub fn get(&self) -> WorkMode {
        WorkMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    pub fn set(&self, mode: WorkMode) {
        self.mode.store(mode as u8, Ordering::Relaxed);
    }
}
