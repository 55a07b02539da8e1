//! # Scheduler Module
//!
//! The control loop that turns channel state into downlink frames.
//!
//! This module handles:
//! - Draining pending commands and joystick input into the channel store
//! - Sending channels at a fixed period with early sends for commands
//! - Clock, stop signal and work-mode plumbing shared with the telemetry task

pub mod clock;
pub mod control_loop;
pub mod mode;
pub mod signal;

pub use clock::{Clock, ManualClock, SystemClock};
pub use control_loop::{Scheduler, SchedulerTiming};
pub use mode::{ModeSwitch, WorkMode};
pub use signal::StopSignal;
