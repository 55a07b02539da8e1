//! Command line parser.

use tracing::{debug, info};

use crate::channels::ChannelStore;

/// Keyword for a batch channel update
pub const KEYWORD_SET_CHANNELS: &str = "setChannels";
/// Keyword for a single channel update
pub const KEYWORD_SET_CHANNEL: &str = "setChannel";
/// Legacy send trigger, kept for older producers
pub const KEYWORD_SEND_CHANNELS: &str = "sendChannels";
/// Mode change request
pub const KEYWORD_SET_MODE: &str = "setMode";

/// A single requested channel write (1-based channel).
///
/// Not range-checked; the [`ChannelStore`] rejects invalid writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelWrite {
    pub channel: usize,
    pub value: i32,
}

/// A recognized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `setChannel <idx> <val>`
    SetChannel(ChannelWrite),
    /// `setChannels <idx>=<val> ...` with the well-formed pairs only
    SetChannels(Vec<ChannelWrite>),
    /// `sendChannels`
    SendChannels,
    /// `setMode <name>`; mode itself is owned elsewhere
    SetMode(String),
    /// Known keyword with unusable arguments
    Malformed(&'static str),
}

impl Command {
    /// Applies the command to `store`, returning how many writes landed.
    pub fn apply(&self, store: &ChannelStore) -> usize {
        match self {
            Command::SetChannel(write) => {
                usize::from(store.set_channel(write.channel, write.value))
            }
            Command::SetChannels(writes) => writes
                .iter()
                .filter(|write| store.set_channel(write.channel, write.value))
                .count(),
            Command::SetMode(mode) => {
                info!("Mode change requested: {}", mode);
                0
            }
            Command::SendChannels | Command::Malformed(_) => 0,
        }
    }
}

/// Parses one command line.
///
/// Returns `None` for blank lines, comments and unknown keywords.
///
/// # Examples
///
/// ```
/// use rc_groundlink::command::{parse_line, ChannelWrite, Command};
///
/// assert_eq!(
///     parse_line("setChannel 5 1700"),
///     Some(Command::SetChannel(ChannelWrite { channel: 5, value: 1700 }))
/// );
/// assert_eq!(parse_line("# comment"), None);
/// ```
#[must_use]
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut tokens = line.split_whitespace();
    let keyword = tokens.next()?;

    match keyword {
        KEYWORD_SET_CHANNELS => Some(Command::SetChannels(
            tokens.filter_map(parse_pair).collect(),
        )),
        KEYWORD_SET_CHANNEL => {
            let args: Vec<&str> = tokens.collect();
            match args.as_slice() {
                [channel, value] => match (channel.parse::<usize>(), value.parse::<i32>()) {
                    (Ok(channel), Ok(value)) => {
                        Some(Command::SetChannel(ChannelWrite { channel, value }))
                    }
                    _ => Some(Command::Malformed(KEYWORD_SET_CHANNEL)),
                },
                _ => Some(Command::Malformed(KEYWORD_SET_CHANNEL)),
            }
        }
        KEYWORD_SEND_CHANNELS if line == KEYWORD_SEND_CHANNELS => Some(Command::SendChannels),
        KEYWORD_SET_MODE => {
            let mode = line[KEYWORD_SET_MODE.len()..].trim();
            Some(Command::SetMode(mode.to_string()))
        }
        _ => {
            debug!("Ignoring unrecognized command: {}", line);
            None
        }
    }
}

fn parse_pair(token: &str) -> Option<ChannelWrite> {
    let (channel, value) = token.split_once('=')?;
    Some(ChannelWrite {
        channel: channel.parse().ok()?,
        value: value.parse().ok()?,
    })
}
