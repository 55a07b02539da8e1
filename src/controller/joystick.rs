//! # Joystick Module
//!
//! Reads joystick axes through the Linux evdev interface.
//!
//! ## Device Selection
//!
//! - An explicit `/dev/input/eventX` path from the config is opened as-is.
//! - With an empty path, all input devices are scanned in path order and the
//!   first one exposing both `ABS_X` and `ABS_Y` is used.
//!
//! ## Axis Numbering
//!
//! Logical axis `n` is the n-th absolute axis the device supports, in
//! ascending evdev code order. This is the same numbering the kernel joystick
//! API (`/dev/input/jsX`) uses, so axis 0-3 keep their usual meaning.

use evdev::{AbsoluteAxisType, Device};
use tracing::{debug, info, warn};

use super::device::InputDevice;
use crate::error::{GroundLinkError, Result};

/// Joystick handle backed by an evdev device.
///
/// Polling reads the current absolute-axis state with an ioctl, so it never
/// blocks waiting for events.
pub struct EvdevJoystick {
    device: Device,
    device_path: String,
    axes: Vec<AbsoluteAxisType>,
    values: Vec<Option<i16>>,
    button_count: usize,
    poll_failed: bool,
}

impl std::fmt::Debug for EvdevJoystick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevJoystick")
            .field("device_path", &self.device_path)
            .field("axes", &self.axes.len())
            .field("buttons", &self.button_count)
            .finish_non_exhaustive()
    }
}

impl EvdevJoystick {
    /// Open a joystick.
    ///
    /// # Arguments
    ///
    /// * `device_path` - evdev node to open, or `""` to auto-detect
    ///
    /// # Errors
    ///
    /// - `InputDevice`: the path cannot be opened or has no joystick axes
    /// - `InputDeviceNotFound`: auto-detection found nothing usable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rc_groundlink::controller::joystick::EvdevJoystick;
    ///
    /// let joystick = EvdevJoystick::open("")?;
    /// println!("Joystick at: {}", joystick.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(device_path: &str) -> Result<Self> {
        if device_path.is_empty() {
            return Self::detect();
        }

        let device = Device::open(device_path).map_err(|e| {
            GroundLinkError::InputDevice(format!("Failed to open {}: {}", device_path, e))
        })?;

        if !Self::is_joystick(&device) {
            return Err(GroundLinkError::InputDevice(format!(
                "{} does not expose joystick axes",
                device_path
            )));
        }

        Ok(Self::from_device(device, device_path.to_string()))
    }

    fn detect() -> Result<Self> {
        let mut devices: Vec<_> = evdev::enumerate().collect();

        // Sort for deterministic selection when several joysticks are connected
        devices.sort_by(|a, b| a.0.cmp(&b.0));

        for (path, device) in devices {
            debug!(
                "Found input device: {} ({})",
                path.display(),
                device.name().unwrap_or("unnamed")
            );

            if Self::is_joystick(&device) {
                let device_path = path.to_string_lossy().to_string();
                info!("Found joystick at: {}", device_path);
                return Ok(Self::from_device(device, device_path));
            }
        }

        Err(GroundLinkError::InputDeviceNotFound)
    }

    fn is_joystick(device: &Device) -> bool {
        device.supported_absolute_axes().map_or(false, |axes| {
            axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
        })
    }

    fn from_device(device: Device, device_path: String) -> Self {
        let axes: Vec<AbsoluteAxisType> = device
            .supported_absolute_axes()
            .map(|axes| axes.iter().collect())
            .unwrap_or_default();
        let button_count = device.supported_keys().map_or(0, |keys| keys.iter().count());

        Self {
            device,
            device_path,
            values: vec![None; axes.len()],
            axes,
            button_count,
            poll_failed: false,
        }
    }

    /// Get the device path of this joystick
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get joystick name from evdev
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }
}

impl InputDevice for EvdevJoystick {
    fn poll(&mut self) {
        match self.device.get_abs_state() {
            Ok(state) => {
                for (slot, axis) in self.values.iter_mut().zip(&self.axes) {
                    let info = &state[axis.0 as usize];
                    *slot = normalize_axis(info.value, info.minimum, info.maximum);
                }
                if self.poll_failed {
                    info!("Joystick {} readable again", self.device_path);
                    self.poll_failed = false;
                }
            }
            Err(e) => {
                if !self.poll_failed {
                    warn!("Failed to read joystick {}: {}", self.device_path, e);
                    self.poll_failed = true;
                }
                self.values.fill(None);
            }
        }
    }

    fn axis(&self, index: usize) -> Option<i16> {
        self.values.get(index).copied().flatten()
    }

    fn axis_count(&self) -> usize {
        self.axes.len()
    }

    fn button_count(&self) -> usize {
        self.button_count
    }
}

/// Rescales a raw evdev reading from `[minimum, maximum]` onto the signed
/// 16-bit joystick range.
///
/// Returns `None` for a degenerate range.
#[must_use]
pub fn normalize_axis(value: i32, minimum: i32, maximum: i32) -> Option<i16> {
    let span = i64::from(maximum) - i64::from(minimum);
    if span <= 0 {
        return None;
    }

    let offset = (i64::from(value) - i64::from(minimum)).clamp(0, span);
    let scaled = offset * 65535 / span - 32768;
    Some(scaled as i16)
}
