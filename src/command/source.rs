//! Command sources drained by the scheduler on every tick.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

/// Default command file path shared with producer processes
pub const DEFAULT_COMMAND_FILE: &str = "/tmp/crsf_command.txt";

/// A poll-and-drain queue of command lines.
///
/// `drain` must return promptly and hand over every pending line exactly once.
pub trait CommandSource: Send {
    /// Take all pending lines, oldest first.
    fn drain(&mut self) -> Vec<String>;
}

/// Command file consumed and deleted after every read.
///
/// The file is first renamed to a private sibling so that a producer creating
/// a new file in the meantime does not lose lines to the delete. A missing
/// file simply means no commands are pending.
#[derive(Debug)]
pub struct FileCommandSource {
    path: PathBuf,
    claim_path: PathBuf,
    last_error: Option<io::ErrorKind>,
}

impl FileCommandSource {
    /// Creates a source reading `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut claim = path.clone().into_os_string();
        claim.push(".claimed");

        Self {
            path,
            claim_path: PathBuf::from(claim),
            last_error: None,
        }
    }

    /// Path of the command file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_claimed(&self) -> io::Result<Vec<String>> {
        let bytes = fs::read(&self.claim_path)?;
        fs::remove_file(&self.claim_path)?;

        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn report(&mut self, error: io::Error) {
        // Warn once per distinct failure, the loop retries every tick
        if self.last_error != Some(error.kind()) {
            warn!("Failed to read command file {}: {}", self.path.display(), error);
            self.last_error = Some(error.kind());
        }
    }

    fn drain_into(&self, lines: &mut Vec<String>) -> io::Result<()> {
        // A claim left behind by a failed read is consumed before claiming again,
        // otherwise the rename would overwrite it
        if self.claim_path.exists() {
            lines.extend(self.read_claimed()?);
        }

        match fs::rename(&self.path, &self.claim_path) {
            Ok(()) => {
                lines.extend(self.read_claimed()?);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl CommandSource for FileCommandSource {
    fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();

        match self.drain_into(&mut lines) {
            Ok(()) => self.last_error = None,
            Err(e) => self.report(e),
        }

        if !lines.is_empty() {
            debug!("Read {} command line(s) from {}", lines.len(), self.path.display());
        }
        lines
    }
}

/// In-memory command queue.
///
/// Clones share the same queue, so one handle can be given to a producer
/// while the scheduler drains another.
///
/// # Examples
///
/// ```
/// use rc_groundlink::command::{CommandSource, QueueCommandSource};
///
/// let mut source = QueueCommandSource::new();
/// let producer = source.clone();
///
/// producer.push("setChannel 1 1200");
/// assert_eq!(source.drain(), vec!["setChannel 1 1200".to_string()]);
/// assert!(source.drain().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueueCommandSource {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl QueueCommandSource {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues one command line.
    pub fn push<S: Into<String>>(&self, line: S) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(line.into());
    }
}

impl CommandSource for QueueCommandSource {
    fn drain(&mut self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}
