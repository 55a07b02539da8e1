//! # Command Module
//!
//! Line-based command protocol used by external processes to drive channels.
//!
//! This module handles:
//! - Parsing command lines into [`Command`] values
//! - Applying parsed commands to the [`ChannelStore`](crate::channels::ChannelStore)
//! - Draining pending command lines from a file or an in-memory queue
//!
//! ## Grammar
//!
//! | Line | Effect |
//! |------|--------|
//! | `# ...` or blank | ignored |
//! | `setChannels 1=1200 3=1800` | one write per well-formed pair |
//! | `setChannel 5 1700` | one write |
//! | `sendChannels` | no state change |
//! | `setMode <name>` | logged only |
//!
//! Every recognized line asks the scheduler for an expedited send.

pub mod parser;
pub mod source;

pub use parser::{parse_line, ChannelWrite, Command};
pub use source::{CommandSource, FileCommandSource, QueueCommandSource};
