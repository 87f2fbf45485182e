//! Store configuration.
//!
//! The payload width is not recorded in the data file, so the same width
//! must be supplied every time a file is reopened. `FixDbConfig` can be
//! persisted next to the data file as a JSON sidecar to make that automatic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FlagError, Result};

/// Default payload width in bytes.
pub const DEFAULT_PAYLOAD_WIDTH: usize = 24;

/// Default read-ahead for full scans (1 MiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Configuration for a fixed-record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixDbConfig {
    /// Payload width W. Record size is `8 + W`; zero gives key-only
    /// records.
    pub payload_width: usize,

    /// Buffer size used by sequential scans (not persisted).
    #[serde(skip, default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

fn default_read_buffer_size() -> usize {
    DEFAULT_READ_BUFFER_SIZE
}

impl Default for FixDbConfig {
    fn default() -> Self {
        Self {
            payload_width: DEFAULT_PAYLOAD_WIDTH,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl FixDbConfig {
    /// Config with the given payload width and default buffering.
    pub fn new(payload_width: usize) -> Self {
        Self {
            payload_width,
            ..Default::default()
        }
    }

    /// Set payload width
    pub fn payload_width(mut self, width: usize) -> Self {
        self.payload_width = width;
        self
    }

    /// Set scan buffer size
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Reject settings a store cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(FlagError::InvalidConfig(
                "read buffer size must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Sidecar path for a data file: `<data file>.json`.
    pub fn sidecar_path(data_path: &Path) -> PathBuf {
        let mut name = data_path.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    }

    /// Read the sidecar for a data file. Returns None if it doesn't exist.
    pub fn read_from(data_path: &Path) -> Result<Option<Self>> {
        let path = Self::sidecar_path(data_path);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Write the sidecar for a data file.
    pub fn write_to(&self, data_path: &Path) -> Result<()> {
        let path = Self::sidecar_path(data_path);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(())
    }
}
