//! # Control Loop
//!
//! One reactive tick, run every `tick_ms` (1 ms by default):
//!
//! 1. Let the transport process received uplink data
//! 2. Drain and apply pending commands
//! 3. Poll the joystick and, in joystick mode, map its axes
//! 4. Decide whether to send
//! 5. Send: snapshot the store, stage all 16 channels, send
//!
//! ## Send Timing
//!
//! | Condition | Action |
//! |-----------|--------|
//! | `send_period_ms` since the last send | send (periodic guarantee) |
//! | joystick input pending, `min_send_spacing_ms` since the last send | send early |
//! | command pending, `min_send_spacing_ms` since the last send and since it arrived | send early |
//! | otherwise | wait |
//!
//! Before the first send, the first tick stands in for the last send, so the
//! first frame leaves one full period after start.
//!
//! Steady-state latency is bounded by the period while bursts of commands go
//! out sooner, never closer together than the minimum spacing.

use std::sync::Arc;

use tracing::{debug, info};

use super::clock::Clock;
use super::mode::{ModeSwitch, WorkMode};
use super::signal::StopSignal;
use crate::channels::ChannelStore;
use crate::command::{parse_line, CommandSource};
use crate::config::SchedulerConfig;
use crate::controller::{InputDevice, InputMapper};
use crate::transport::Transport;

/// Default send period (~100Hz)
pub const DEFAULT_SEND_PERIOD_MS: u64 = 10;

/// Default minimum spacing between two sends (~500Hz ceiling)
pub const DEFAULT_MIN_SEND_SPACING_MS: u64 = 2;

/// Default sleep between ticks
pub const DEFAULT_TICK_MS: u64 = 1;

/// Number of sends between status log messages
const LOG_INTERVAL_SENDS: u64 = 1000;

/// Timing parameters of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTiming {
    pub send_period_ms: u64,
    pub min_send_spacing_ms: u64,
    pub tick_ms: u64,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            send_period_ms: DEFAULT_SEND_PERIOD_MS,
            min_send_spacing_ms: DEFAULT_MIN_SEND_SPACING_MS,
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

impl From<&SchedulerConfig> for SchedulerTiming {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            send_period_ms: config.send_period_ms,
            min_send_spacing_ms: config.min_send_spacing_ms,
            tick_ms: config.tick_ms,
        }
    }
}

/// Channel scheduler driving the downlink transport.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use rc_groundlink::channels::ChannelStore;
/// use rc_groundlink::command::QueueCommandSource;
/// use rc_groundlink::scheduler::{Scheduler, SchedulerTiming, WorkMode};
/// use rc_groundlink::transport::LoopbackTransport;
///
/// let store = Arc::new(ChannelStore::new());
/// let transport = Arc::new(LoopbackTransport::new());
/// let commands = QueueCommandSource::new();
///
/// let mut scheduler = Scheduler::new(
///     store,
///     transport.clone(),
///     Box::new(commands.clone()),
///     SchedulerTiming::default(),
/// );
///
/// assert!(!scheduler.tick(0, WorkMode::Manual)); // Period starts here
/// assert!(!scheduler.tick(5, WorkMode::Manual));
/// assert!(scheduler.tick(10, WorkMode::Manual));
/// assert_eq!(transport.frames_sent(), 1);
/// ```
pub struct Scheduler {
    store: Arc<ChannelStore>,
    transport: Arc<dyn Transport>,
    commands: Box<dyn CommandSource>,
    input: Option<Box<dyn InputDevice>>,
    mapper: InputMapper,
    timing: SchedulerTiming,
    period_start_ms: Option<u64>,
    last_send_ms: Option<u64>,
    command_pending_since_ms: Option<u64>,
    input_pending: bool,
    sends: u64,
    last_mode: Option<WorkMode>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("timing", &self.timing)
            .field("has_input", &self.input.is_some())
            .field("last_send_ms", &self.last_send_ms)
            .field("command_pending_since_ms", &self.command_pending_since_ms)
            .field("input_pending", &self.input_pending)
            .field("sends", &self.sends)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler without an input device.
    pub fn new(
        store: Arc<ChannelStore>,
        transport: Arc<dyn Transport>,
        commands: Box<dyn CommandSource>,
        timing: SchedulerTiming,
    ) -> Self {
        Self {
            store,
            transport,
            commands,
            input: None,
            mapper: InputMapper::new(),
            timing,
            period_start_ms: None,
            last_send_ms: None,
            command_pending_since_ms: None,
            input_pending: false,
            sends: 0,
            last_mode: None,
        }
    }

    /// Attaches a joystick to poll every tick.
    #[must_use]
    pub fn with_input(mut self, device: Box<dyn InputDevice>) -> Self {
        self.input = Some(device);
        self
    }

    /// Total number of sends so far.
    pub fn sends(&self) -> u64 {
        self.sends
    }

    /// Time of the last send, if any.
    pub fn last_send_ms(&self) -> Option<u64> {
        self.last_send_ms
    }

    /// Runs one tick at `now_ms`. Returns `true` if channels were sent.
    pub fn tick(&mut self, now_ms: u64, mode: WorkMode) -> bool {
        if self.last_mode != Some(mode) {
            info!("Scheduler work mode: {}", mode);
            self.last_mode = Some(mode);
        }

        let period_start = *self.period_start_ms.get_or_insert(now_ms);

        self.transport.process_incoming();

        if self.drain_commands() {
            self.command_pending_since_ms.get_or_insert(now_ms);
        }

        if let Some(device) = self.input.as_mut() {
            device.poll();
            if mode == WorkMode::Joystick {
                self.mapper.apply(&**device, &self.store);
                self.input_pending = true;
            }
        }

        if self.should_send(now_ms, period_start) {
            self.send(now_ms);
            true
        } else {
            false
        }
    }

    /// Ticks until `stop` is raised, sleeping `tick_ms` between ticks.
    pub fn run(&mut self, clock: &dyn Clock, mode: &ModeSwitch, stop: &StopSignal) {
        info!(
            "Starting channel scheduler (period {}ms, min spacing {}ms, tick {}ms)",
            self.timing.send_period_ms, self.timing.min_send_spacing_ms, self.timing.tick_ms
        );

        while !stop.is_raised() {
            self.tick(clock.now_ms(), mode.get());
            clock.sleep_ms(self.timing.tick_ms);
        }

        info!("Channel scheduler stopped, total sends: {}", self.sends);
    }

    /// Applies every pending command; returns true if any was recognized.
    fn drain_commands(&mut self) -> bool {
        let mut recognized = false;
        for line in self.commands.drain() {
            if let Some(command) = parse_line(&line) {
                let applied = command.apply(&self.store);
                debug!("Command {:?} applied {} write(s)", command, applied);
                recognized = true;
            }
        }
        recognized
    }

    fn should_send(&self, now_ms: u64, period_start_ms: u64) -> bool {
        let since_last = now_ms.saturating_sub(period_start_ms);
        if since_last >= self.timing.send_period_ms {
            return true;
        }
        if since_last < self.timing.min_send_spacing_ms {
            return false;
        }

        // Commands also wait out the spacing from their own arrival
        self.input_pending
            || self.command_pending_since_ms.map_or(false, |arrived| {
                now_ms.saturating_sub(arrived) >= self.timing.min_send_spacing_ms
            })
    }

    fn send(&mut self, now_ms: u64) {
        let channels = self.store.snapshot();
        for (i, &value) in channels.iter().enumerate() {
            self.transport.set_channel(i + 1, value);
        }
        self.transport.send_channels();

        self.period_start_ms = Some(now_ms);
        self.last_send_ms = Some(now_ms);
        self.command_pending_since_ms = None;
        self.input_pending = false;
        self.sends += 1;

        if self.sends % LOG_INTERVAL_SENDS == 0 {
            debug!("Sent {} channel frames", self.sends);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::QueueCommandSource;
    use crate::controller::device::MockInputDevice;
    use crate::scheduler::clock::ManualClock;
    use crate::transport::LoopbackTransport;

    struct Fixture {
        store: Arc<ChannelStore>,
        transport: Arc<LoopbackTransport>,
        commands: QueueCommandSource,
        scheduler: Scheduler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(ChannelStore::new());
        let transport = Arc::new(LoopbackTransport::new());
        let commands = QueueCommandSource::new();
        let scheduler = Scheduler::new(
            Arc::clone(&store),
            transport.clone(),
            Box::new(commands.clone()),
            SchedulerTiming::default(),
        );
        Fixture {
            store,
            transport,
            commands,
            scheduler,
        }
    }

    fn joystick(values: [i16; 4]) -> Box<MockInputDevice> {
        let mut device = MockInputDevice::new();
        device.expect_poll().return_const(());
        device
            .expect_axis()
            .returning(move |index| values.get(index).copied());
        Box::new(device)
    }

    // ==================== Timing Tests ====================

    #[test]
    fn test_timing_defaults() {
        let timing = SchedulerTiming::default();
        assert_eq!(timing.send_period_ms, 10);
        assert_eq!(timing.min_send_spacing_ms, 2);
        assert_eq!(timing.tick_ms, 1);
    }

    #[test]
    fn test_first_send_after_one_period() {
        let mut f = fixture();

        let sent_at: Vec<u64> = (0..=10)
            .filter(|&t| f.scheduler.tick(t, WorkMode::Manual))
            .collect();

        assert_eq!(sent_at, vec![10]);
        assert_eq!(f.scheduler.last_send_ms(), Some(10));
        assert_eq!(f.transport.frames_sent(), 1);
    }

    #[test]
    fn test_period_starts_at_first_tick() {
        let mut f = fixture();
        assert!(!f.scheduler.tick(1234, WorkMode::Manual));
        assert_eq!(f.scheduler.last_send_ms(), None);
        assert!(!f.scheduler.tick(1243, WorkMode::Manual));
        assert!(f.scheduler.tick(1244, WorkMode::Manual));
    }

    #[test]
    fn test_periodic_send_every_10ms() {
        let mut f = fixture();
        assert!(!f.scheduler.tick(0, WorkMode::Manual));

        for t in 1..10 {
            assert!(!f.scheduler.tick(t, WorkMode::Manual), "unexpected send at {}ms", t);
        }
        assert!(f.scheduler.tick(10, WorkMode::Manual));

        for t in 11..20 {
            assert!(!f.scheduler.tick(t, WorkMode::Manual), "unexpected send at {}ms", t);
        }
        assert!(f.scheduler.tick(20, WorkMode::Manual));
        assert_eq!(f.transport.frames_sent(), 2);
    }

    #[test]
    fn test_late_tick_sends_once() {
        let mut f = fixture();
        f.scheduler.tick(0, WorkMode::Manual);

        // A stalled tick sends once, no catch-up burst
        assert!(f.scheduler.tick(35, WorkMode::Manual));
        assert!(!f.scheduler.tick(36, WorkMode::Manual));
        assert!(f.scheduler.tick(45, WorkMode::Manual));
    }

    #[test]
    fn test_command_expedites_after_min_spacing() {
        let mut f = fixture();
        f.scheduler.tick(90, WorkMode::Manual);
        assert!(f.scheduler.tick(100, WorkMode::Manual));

        // Command arrives 3ms after the last send
        f.commands.push("setChannel 1 1800");
        assert!(!f.scheduler.tick(103, WorkMode::Manual), "must not send immediately");
        assert!(!f.scheduler.tick(104, WorkMode::Manual));
        assert!(f.scheduler.tick(105, WorkMode::Manual), "should send 2ms after the command");

        assert_eq!(f.transport.last_frame()[0], 1800);

        // Back to the periodic cadence
        for t in 106..115 {
            assert!(!f.scheduler.tick(t, WorkMode::Manual));
        }
        assert!(f.scheduler.tick(115, WorkMode::Manual));
    }

    #[test]
    fn test_command_right_after_send_waits_for_spacing() {
        let mut f = fixture();
        f.scheduler.tick(0, WorkMode::Manual);
        assert!(f.scheduler.tick(10, WorkMode::Manual));

        f.commands.push("sendChannels");
        assert!(!f.scheduler.tick(11, WorkMode::Manual));
        assert!(!f.scheduler.tick(12, WorkMode::Manual));
        assert!(f.scheduler.tick(13, WorkMode::Manual));
    }

    #[test]
    fn test_command_burst_coalesces() {
        let mut f = fixture();
        f.scheduler.tick(0, WorkMode::Manual);

        f.commands.push("setChannel 1 1100");
        f.scheduler.tick(4, WorkMode::Manual);
        f.commands.push("setChannel 1 1200");
        assert!(!f.scheduler.tick(5, WorkMode::Manual));
        assert!(f.scheduler.tick(6, WorkMode::Manual));

        assert_eq!(f.transport.frames_sent(), 1);
        assert_eq!(f.transport.last_frame()[0], 1200);
    }

    #[test]
    fn test_unrecognized_lines_do_not_expedite() {
        let mut f = fixture();
        f.scheduler.tick(0, WorkMode::Manual);

        f.commands.push("# just a comment");
        f.commands.push("bogus 1 2");
        for t in 1..10 {
            assert!(!f.scheduler.tick(t, WorkMode::Manual));
        }
    }

    #[test]
    fn test_periodic_send_clears_expedite() {
        let mut f = fixture();
        f.scheduler.tick(0, WorkMode::Manual);

        f.commands.push("setChannel 2 1600");
        f.scheduler.tick(9, WorkMode::Manual);
        assert!(f.scheduler.tick(10, WorkMode::Manual));

        // Nothing pending: no early send at 12
        assert!(!f.scheduler.tick(12, WorkMode::Manual));
    }

    // ==================== Channel Flow Tests ====================

    #[test]
    fn test_send_carries_store_snapshot() {
        let mut f = fixture();
        f.scheduler.tick(0, WorkMode::Manual);
        f.commands.push("setChannels 1=1200 3=1800 99=1 1=abc");
        f.scheduler.tick(1, WorkMode::Manual);
        assert!(f.scheduler.tick(3, WorkMode::Manual));

        let frame = f.transport.last_frame();
        assert_eq!(frame[0], 1200);
        assert_eq!(frame[2], 1800);
        assert_eq!(frame, f.store.snapshot());
    }

    #[test]
    fn test_initial_frame_is_failsafe() {
        let mut f = fixture();
        f.scheduler.tick(0, WorkMode::Manual);
        assert!(f.scheduler.tick(10, WorkMode::Manual));

        let frame = f.transport.last_frame();
        assert_eq!(frame[2], 1000);
        assert_eq!(frame.iter().filter(|&&v| v == 1500).count(), 15);
    }

    // ==================== Input Tests ====================

    #[test]
    fn test_joystick_ignored_in_manual_mode() {
        let f = fixture();
        let mut scheduler = f.scheduler.with_input(joystick([30000, -30000, 30000, -30000]));

        scheduler.tick(0, WorkMode::Manual);

        assert_eq!(f.store.snapshot()[..4], [1500, 1500, 1000, 1500]);
    }

    #[test]
    fn test_joystick_drives_channels_in_joystick_mode() {
        let f = fixture();
        let mut scheduler = f.scheduler.with_input(joystick([30000, -30000, -30000, 30000]));

        // Mapped right away, sent once the minimum spacing has passed
        assert!(!scheduler.tick(0, WorkMode::Joystick));
        assert!(!scheduler.tick(1, WorkMode::Joystick));
        assert!(scheduler.tick(2, WorkMode::Joystick));

        let channels = f.store.snapshot();
        assert_eq!(channels[3], 1957); // Yaw
        assert_eq!(channels[2], 1957); // Throttle, inverted
        assert_eq!(channels[0], 1043); // Roll
        assert_eq!(channels[1], 1043); // Pitch, inverted
        assert_eq!(f.transport.last_frame(), channels);
    }

    #[test]
    fn test_joystick_mode_sends_every_min_spacing() {
        let f = fixture();
        let mut scheduler = f.scheduler.with_input(joystick([0, 0, 0, 0]));

        let sent_at: Vec<u64> = (0..=20)
            .filter(|&t| scheduler.tick(t, WorkMode::Joystick))
            .collect();

        // Every tick requests an early send; spacing caps the rate at 500Hz
        assert_eq!(sent_at, vec![2, 4, 6, 8, 10, 12, 14, 16, 18, 20]);
    }

    #[test]
    fn test_command_in_joystick_mode_keeps_min_spacing() {
        let f = fixture();
        let commands = f.commands.clone();
        let mut scheduler = f.scheduler.with_input(joystick([0, 0, 0, 0]));

        scheduler.tick(0, WorkMode::Joystick);
        commands.push("setChannel 6 1800");
        assert!(scheduler.tick(2, WorkMode::Joystick));
        assert_eq!(f.transport.last_frame()[5], 1800);
        assert!(!scheduler.tick(3, WorkMode::Joystick));
        assert!(scheduler.tick(4, WorkMode::Joystick));
    }

    #[test]
    fn test_input_polled_every_tick_in_manual_mode() {
        let f = fixture();
        let mut device = MockInputDevice::new();
        device.expect_poll().times(3).return_const(());
        device.expect_axis().never();

        let mut scheduler = f.scheduler.with_input(Box::new(device));
        for t in 0..3 {
            scheduler.tick(t, WorkMode::Manual);
        }
    }

    // ==================== Run Loop Tests ====================

    /// Clock that raises the stop signal once time reaches a deadline.
    struct StoppingClock {
        inner: ManualClock,
        deadline_ms: u64,
        stop: StopSignal,
    }

    impl Clock for StoppingClock {
        fn now_ms(&self) -> u64 {
            self.inner.now_ms()
        }

        fn sleep_ms(&self, ms: u64) {
            self.inner.sleep_ms(ms);
            if self.inner.now_ms() >= self.deadline_ms {
                self.stop.raise();
            }
        }
    }

    #[test]
    fn test_run_until_stopped() {
        let mut f = fixture();
        let stop = StopSignal::new();
        let clock = StoppingClock {
            inner: ManualClock::new(0),
            deadline_ms: 100,
            stop: stop.clone(),
        };

        f.scheduler.run(&clock, &ModeSwitch::new(WorkMode::Manual), &stop);

        // Ticks at 0..=99, sends at 10, 20, ..., 90
        assert_eq!(f.scheduler.sends(), 9);
        assert_eq!(f.transport.frames_sent(), 9);
    }

    #[test]
    fn test_run_returns_immediately_when_stopped() {
        let mut f = fixture();
        let stop = StopSignal::new();
        stop.raise();

        f.scheduler.run(&ManualClock::new(0), &ModeSwitch::default(), &stop);
        assert_eq!(f.scheduler.sends(), 0);
    }
}
