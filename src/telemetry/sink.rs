//! Output channel for encoded telemetry records.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Default telemetry file path read by external consumers
pub const DEFAULT_TELEMETRY_FILE: &str = "/tmp/crsf_telemetry.dat";

/// Destination for complete telemetry records.
///
/// Each publish fully replaces the previous record; readers must never see a
/// mix of two records.
pub trait TelemetrySink: Send {
    /// Replace the published record with `record`.
    fn publish(&mut self, record: &[u8]) -> io::Result<()>;
}

/// Telemetry file replaced atomically on every publish.
///
/// The record is written to a sibling temporary file and renamed over the
/// target, so a reader opening the path gets either the old or the new record.
#[derive(Debug)]
pub struct FileTelemetrySink {
    path: PathBuf,
    staging_path: PathBuf,
}

impl FileTelemetrySink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");

        Self {
            path,
            staging_path: PathBuf::from(staging),
        }
    }

    /// Path readers open
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySink for FileTelemetrySink {
    fn publish(&mut self, record: &[u8]) -> io::Result<()> {
        let mut file = fs::File::create(&self.staging_path)?;
        file.write_all(record)?;
        file.flush()?;
        drop(file);

        fs::rename(&self.staging_path, &self.path)
    }
}
