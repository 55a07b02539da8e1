//! Loopback transport.
//!
//! Echoes every sent channel frame back as the received uplink state. Used by
//! the binary when no radio backend is linked in, and by tests.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, info};

use super::{AttitudeSensor, BatterySensor, GpsSensor, Transport};
use crate::channels::{initial_channels, ChannelSet, CHANNEL_COUNT};

/// Link is reported down when nothing was sent for this long
pub const LINK_TIMEOUT_MS: u32 = 500;

/// Number of frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 1000;

#[derive(Debug)]
struct LoopbackState {
    staged: ChannelSet,
    uplink: ChannelSet,
    link_up: bool,
    last_receive_ms: u32,
    frames_sent: u64,
    gps: Option<GpsSensor>,
    battery: BatterySensor,
    attitude: AttitudeSensor,
}

/// In-process transport that loops sent channels back as uplink data.
#[derive(Debug)]
pub struct LoopbackTransport {
    started: Instant,
    state: Mutex<LoopbackState>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackTransport {
    /// Creates a transport with the link down and no sensor data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            state: Mutex::new(LoopbackState {
                staged: initial_channels(),
                uplink: initial_channels(),
                link_up: false,
                last_receive_ms: 0,
                frames_sent: 0,
                gps: None,
                battery: BatterySensor::default(),
                attitude: AttitudeSensor::default(),
            }),
        }
    }

    /// Number of channel frames sent so far.
    pub fn frames_sent(&self) -> u64 {
        self.lock().frames_sent
    }

    /// Channels carried by the most recent frame.
    pub fn last_frame(&self) -> ChannelSet {
        self.lock().uplink
    }

    /// Injects a GPS report.
    pub fn set_gps(&self, gps: GpsSensor) {
        self.lock().gps = Some(gps);
    }

    /// Injects a battery report.
    pub fn set_battery(&self, battery: BatterySensor) {
        self.lock().battery = battery;
    }

    /// Injects an attitude report.
    pub fn set_attitude(&self, attitude: AttitudeSensor) {
        self.lock().attitude = attitude;
    }

    fn elapsed_ms(&self) -> u32 {
        u32::try_from(self.started.elapsed().as_millis()).unwrap_or(u32::MAX)
    }

    fn lock(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for LoopbackTransport {
    fn process_incoming(&self) {
        let now = self.elapsed_ms();
        let mut state = self.lock();
        if state.link_up && now.saturating_sub(state.last_receive_ms) > LINK_TIMEOUT_MS {
            info!("Loopback link down (no frame for {}ms)", LINK_TIMEOUT_MS);
            state.link_up = false;
        }
    }

    fn set_channel(&self, channel: usize, value: u16) {
        if (1..=CHANNEL_COUNT).contains(&channel) {
            self.lock().staged[channel - 1] = value;
        }
    }

    fn send_channels(&self) {
        let now = self.elapsed_ms();
        let mut guard = self.lock();
        let state = &mut *guard;

        state.uplink = state.staged;
        state.last_receive_ms = now;
        state.frames_sent += 1;

        if !state.link_up {
            debug!("Loopback link up");
            state.link_up = true;
        }

        if state.frames_sent % LOG_INTERVAL_FRAMES == 0 {
            info!(
                "Sent {} frames (roll {}, pitch {}, throttle {}, yaw {})",
                state.frames_sent,
                state.uplink[0],
                state.uplink[1],
                state.uplink[2],
                state.uplink[3]
            );
        }
    }

    fn is_link_up(&self) -> bool {
        self.lock().link_up
    }

    fn last_receive_ms(&self) -> u32 {
        self.lock().last_receive_ms
    }

    fn channel(&self, channel: usize) -> i32 {
        if (1..=CHANNEL_COUNT).contains(&channel) {
            i32::from(self.lock().uplink[channel - 1])
        } else {
            0
        }
    }

    fn gps(&self) -> Option<GpsSensor> {
        self.lock().gps
    }

    fn battery(&self) -> BatterySensor {
        self.lock().battery
    }

    fn attitude(&self) -> AttitudeSensor {
        self.lock().attitude
    }
}
