//! Periodic telemetry snapshot task.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::record::TelemetryRecord;
use super::sink::TelemetrySink;
use crate::scheduler::{Clock, StopSignal};
use crate::transport::{GpsSensor, Transport};

/// Default snapshot period (50Hz)
pub const DEFAULT_TELEMETRY_PERIOD_MS: u64 = 20;

/// Number of publishes between status log messages
const LOG_INTERVAL_PUBLISHES: u64 = 3000;

/// Samples the transport and publishes a [`TelemetryRecord`] every period.
///
/// Runs independently of the channel scheduler. The period is a rate limit:
/// a slow cycle shortens the next wait, it never triggers a catch-up burst.
pub struct TelemetrySnapshotter {
    transport: Option<Arc<dyn Transport>>,
    sink: Box<dyn TelemetrySink>,
    period_ms: u64,
    record: TelemetryRecord,
    publishes: u64,
    publish_failing: bool,
}

impl std::fmt::Debug for TelemetrySnapshotter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySnapshotter")
            .field("has_transport", &self.transport.is_some())
            .field("period_ms", &self.period_ms)
            .field("publishes", &self.publishes)
            .finish_non_exhaustive()
    }
}

impl TelemetrySnapshotter {
    /// Creates a snapshotter.
    ///
    /// `transport` is `None` when the uplink was never initialized; [`run`](Self::run)
    /// then exits immediately.
    pub fn new(
        transport: Option<Arc<dyn Transport>>,
        sink: Box<dyn TelemetrySink>,
        period_ms: u64,
    ) -> Self {
        Self {
            transport,
            sink,
            period_ms,
            record: TelemetryRecord::default(),
            publishes: 0,
            publish_failing: false,
        }
    }

    /// Number of successful publishes.
    pub fn publishes(&self) -> u64 {
        self.publishes
    }

    /// Most recently built record.
    pub fn record(&self) -> &TelemetryRecord {
        &self.record
    }

    /// Publishes every `period_ms` until `stop` is raised.
    pub fn run(&mut self, clock: &dyn Clock, stop: &StopSignal) {
        let Some(transport) = self.transport.clone() else {
            error!("Transport not initialized, telemetry task exiting");
            return;
        };

        info!("Starting telemetry snapshots every {}ms", self.period_ms);

        let mut last_cycle_ms: Option<u64> = None;
        while !stop.is_raised() {
            let now = clock.now_ms();

            if let Some(last) = last_cycle_ms {
                let elapsed = now.saturating_sub(last);
                if elapsed < self.period_ms {
                    clock.sleep_ms(self.period_ms - elapsed);
                    continue;
                }
            }
            last_cycle_ms = Some(now);

            self.cycle(transport.as_ref());
        }

        info!("Telemetry task stopped, total publishes: {}", self.publishes);
    }

    /// Builds and publishes one record. Returns `true` if it was published.
    pub fn cycle(&mut self, transport: &dyn Transport) -> bool {
        self.sample(transport);
        self.publish()
    }

    /// Refreshes the record from the transport.
    pub fn sample(&mut self, transport: &dyn Transport) {
        let record = &mut self.record;

        record.link_up = transport.is_link_up();
        record.last_receive_ms = transport.last_receive_ms();
        record.timestamp_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);

        for (i, channel) in record.channels.iter_mut().enumerate() {
            *channel = transport.channel(i + 1);
        }

        // Without a fix the last known position is kept
        if let Some(gps) = transport.gps() {
            apply_gps(record, &gps);
        }

        let battery = transport.battery();
        record.voltage = battery.voltage;
        record.current = battery.current;
        record.capacity = battery.capacity;
        record.remaining_percent = battery.remaining_percent;

        let attitude = transport.attitude();
        record.roll = attitude.roll;
        record.pitch = attitude.pitch;
        record.yaw = attitude.yaw;
        record.roll_raw = attitude.roll_raw;
        record.pitch_raw = attitude.pitch_raw;
        record.yaw_raw = attitude.yaw_raw;
    }

    fn publish(&mut self) -> bool {
        match self.sink.publish(&self.record.encode()) {
            Ok(()) => {
                if self.publish_failing {
                    info!("Telemetry publishing recovered");
                    self.publish_failing = false;
                }
                self.publishes += 1;
                if self.publishes % LOG_INTERVAL_PUBLISHES == 0 {
                    debug!("Published {} telemetry records", self.publishes);
                }
                true
            }
            Err(e) => {
                if self.publish_failing {
                    debug!("Skipping telemetry publish: {}", e);
                } else {
                    warn!("Failed to publish telemetry, skipping until it recovers: {}", e);
                    self.publish_failing = true;
                }
                false
            }
        }
    }
}

fn apply_gps(record: &mut TelemetryRecord, gps: &GpsSensor) {
    record.latitude = f64::from(gps.latitude) / 1e7;
    record.longitude = f64::from(gps.longitude) / 1e7;
    record.altitude = f64::from(gps.altitude) - 1000.0;
    record.ground_speed = f64::from(gps.groundspeed) / 10.0;
}
