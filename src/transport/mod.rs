//! # Transport Module
//!
//! The seam to the CRSF radio link.
//!
//! The scheduler pushes channels through [`Transport::set_channel`] and
//! [`Transport::send_channels`]; the telemetry snapshotter reads the uplink
//! state through the getters. Frame encoding, decoding and serial I/O live
//! behind this trait.
//!
//! Both loops share one transport from different threads, so every method
//! takes `&self` and implementations synchronize internally.

pub mod loopback;

pub use loopback::LoopbackTransport;

/// Raw GPS sensor values as carried on the CRSF link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpsSensor {
    /// Latitude in degrees × 10^7
    pub latitude: i32,

    /// Longitude in degrees × 10^7
    pub longitude: i32,

    /// Ground speed in km/h × 10
    pub groundspeed: u16,

    /// Heading in degrees × 100
    pub heading: u16,

    /// Altitude in meters + 1000
    pub altitude: u16,

    /// Number of satellites
    pub satellites: u8,
}

/// Battery sensor telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatterySensor {
    /// Battery voltage in volts
    pub voltage: f32,

    /// Current draw in amperes
    pub current: f32,

    /// Capacity used in mAh
    pub capacity: f32,

    /// Battery remaining percentage (0-100%)
    pub remaining_percent: u8,
}

/// Attitude telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeSensor {
    /// Roll in degrees
    pub roll: f32,
    /// Pitch in degrees
    pub pitch: f32,
    /// Yaw in degrees
    pub yaw: f32,

    /// Roll as sent on the wire (radians × 10000)
    pub roll_raw: i16,
    /// Pitch as sent on the wire (radians × 10000)
    pub pitch_raw: i16,
    /// Yaw as sent on the wire (radians × 10000)
    pub yaw_raw: i16,
}

/// Downlink sender and uplink state provider.
///
/// All calls must return without blocking on the radio.
pub trait Transport: Send + Sync {
    /// Process any received uplink bytes.
    fn process_incoming(&self);

    /// Stage a channel value (1-based) for the next send.
    fn set_channel(&self, channel: usize, value: u16);

    /// Send the staged channels.
    fn send_channels(&self);

    /// Whether the uplink is currently receiving.
    fn is_link_up(&self) -> bool;

    /// Time of the last uplink reception, in transport milliseconds.
    fn last_receive_ms(&self) -> u32;

    /// Last received uplink channel value (1-based).
    fn channel(&self, channel: usize) -> i32;

    /// Last GPS report, if one has been received.
    fn gps(&self) -> Option<GpsSensor>;

    /// Last battery report.
    fn battery(&self) -> BatterySensor;

    /// Last attitude report.
    fn attitude(&self) -> AttitudeSensor;
}
