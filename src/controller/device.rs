//! Trait abstraction for joystick input to enable testing

/// A polled source of signed 16-bit axis samples.
///
/// Axis samples use the kernel joystick convention: `-32768..=32767`,
/// 0 = centered. Implementations must not block in [`poll`](Self::poll).
#[cfg_attr(test, mockall::automock)]
pub trait InputDevice: Send {
    /// Refresh cached axis values from the device.
    fn poll(&mut self);

    /// Latest sample for axis `index`, or `None` if the axis does not exist or
    /// the last poll failed.
    fn axis(&self, index: usize) -> Option<i16>;

    /// Number of axes the device exposes.
    fn axis_count(&self) -> usize;

    /// Number of buttons the device exposes.
    fn button_count(&self) -> usize;
}
