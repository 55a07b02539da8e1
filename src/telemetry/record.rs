//! # Telemetry Record
//!
//! Fixed 152-byte little-endian record published for external readers.
//!
//! The layout mirrors an 8-byte aligned C struct with natural field
//! alignment, padding included. Field order, widths and padding are a wire
//! contract with existing consumers.
//!
//! | Offset | Size | Field | Type |
//! |--------|------|-------|------|
//! | 0 | 1 | link_up | u8 (0/1) |
//! | 1 | 3 | padding | |
//! | 4 | 4 | last_receive_ms | u32 |
//! | 8 | 64 | channels[16] | i32 |
//! | 72 | 8 | latitude | f64 |
//! | 80 | 8 | longitude | f64 |
//! | 88 | 8 | altitude | f64 |
//! | 96 | 8 | ground_speed | f64 |
//! | 104 | 4 | voltage | f32 |
//! | 108 | 4 | current | f32 |
//! | 112 | 4 | capacity | f32 |
//! | 116 | 1 | remaining_percent | u8 |
//! | 117 | 3 | padding | |
//! | 120 | 4 | roll | f32 |
//! | 124 | 4 | pitch | f32 |
//! | 128 | 4 | yaw | f32 |
//! | 132 | 2 | roll_raw | i16 |
//! | 134 | 2 | pitch_raw | i16 |
//! | 136 | 2 | yaw_raw | i16 |
//! | 138 | 6 | padding | |
//! | 144 | 8 | timestamp_ms | u64 |

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::channels::CHANNEL_COUNT;
use crate::error::{GroundLinkError, Result};

/// Encoded record size in bytes
pub const TELEMETRY_RECORD_SIZE: usize = 152;

/// One snapshot of the uplink state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryRecord {
    /// Uplink currently receiving
    pub link_up: bool,
    /// Transport time of the last reception (ms)
    pub last_receive_ms: u32,
    /// Last received uplink channels
    pub channels: [i32; CHANNEL_COUNT],

    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: f64,
    /// Ground speed in km/h
    pub ground_speed: f64,

    /// Battery voltage in volts
    pub voltage: f32,
    /// Current draw in amperes
    pub current: f32,
    /// Consumed capacity in mAh
    pub capacity: f32,
    /// Battery remaining (0-100%)
    pub remaining_percent: u8,

    /// Roll in degrees
    pub roll: f32,
    /// Pitch in degrees
    pub pitch: f32,
    /// Yaw in degrees
    pub yaw: f32,
    /// Roll as carried on the link
    pub roll_raw: i16,
    /// Pitch as carried on the link
    pub pitch_raw: i16,
    /// Yaw as carried on the link
    pub yaw_raw: i16,

    /// Wall-clock time the snapshot was taken (ms since Unix epoch)
    pub timestamp_ms: u64,
}

impl TelemetryRecord {
    /// Serializes the record into its 152-byte wire form.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(TELEMETRY_RECORD_SIZE);

        buf.put_u8(u8::from(self.link_up));
        buf.put_bytes(0, 3);
        buf.put_u32_le(self.last_receive_ms);
        for &channel in &self.channels {
            buf.put_i32_le(channel);
        }

        buf.put_f64_le(self.latitude);
        buf.put_f64_le(self.longitude);
        buf.put_f64_le(self.altitude);
        buf.put_f64_le(self.ground_speed);

        buf.put_f32_le(self.voltage);
        buf.put_f32_le(self.current);
        buf.put_f32_le(self.capacity);
        buf.put_u8(self.remaining_percent);
        buf.put_bytes(0, 3);

        buf.put_f32_le(self.roll);
        buf.put_f32_le(self.pitch);
        buf.put_f32_le(self.yaw);
        buf.put_i16_le(self.roll_raw);
        buf.put_i16_le(self.pitch_raw);
        buf.put_i16_le(self.yaw_raw);
        buf.put_bytes(0, 6);

        buf.put_u64_le(self.timestamp_ms);

        debug_assert_eq!(buf.len(), TELEMETRY_RECORD_SIZE);
        buf.freeze()
    }

    /// Parses a record from its wire form.
    ///
    /// # Errors
    ///
    /// Returns `Telemetry` error if `data` is not exactly 152 bytes.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() != TELEMETRY_RECORD_SIZE {
            return Err(GroundLinkError::Telemetry(format!(
                "record size {} does not match expected {}",
                data.len(),
                TELEMETRY_RECORD_SIZE
            )));
        }

        let mut record = TelemetryRecord {
            link_up: data.get_u8() != 0,
            ..Default::default()
        };
        data.advance(3);
        record.last_receive_ms = data.get_u32_le();
        for channel in record.channels.iter_mut() {
            *channel = data.get_i32_le();
        }

        record.latitude = data.get_f64_le();
        record.longitude = data.get_f64_le();
        record.altitude = data.get_f64_le();
        record.ground_speed = data.get_f64_le();

        record.voltage = data.get_f32_le();
        record.current = data.get_f32_le();
        record.capacity = data.get_f32_le();
        record.remaining_percent = data.get_u8();
        data.advance(3);

        record.roll = data.get_f32_le();
        record.pitch = data.get_f32_le();
        record.yaw = data.get_f32_le();
        record.roll_raw = data.get_i16_le();
        record.pitch_raw = data.get_i16_le();
        record.yaw_raw = data.get_i16_le();
        data.advance(6);

        record.timestamp_ms = data.get_u64_le();

        Ok(record)
    }
}
