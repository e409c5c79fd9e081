//! Configuration management and validation.
//!
//! Settings are layered: built-in defaults, then an optional JSON config
//! file, then command-line overrides applied by the CLI.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_DAR_PREFIX, DEFAULT_FLUSH_INTERVAL,
    DEFAULT_MAT_PREFIX, DEFAULT_OUTPUT_DIR, DEFAULT_PROGRESS_INTERVAL, DEFAULT_READ_BUFFER_SIZE,
};
use crate::error::{ConverterError, Result};
use crate::exporters::ExporterKind;
use crate::sink::SinkOptions;
use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How lookup tables are built from the source documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PassStrategy {
    /// One forward pass per document; works on non-seekable sources
    #[default]
    SinglePass,
    /// A fresh cursor per list
    Reopen,
}

/// Main configuration for a conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Directory searched for the DAR and MAT documents
    pub input_dir: PathBuf,

    /// Explicit DAR document; skips discovery
    pub dar_path: Option<PathBuf>,

    /// Explicit MAT document; skips discovery
    pub mat_path: Option<PathBuf>,

    pub dar_prefix: String,
    pub mat_prefix: String,

    /// Directory receiving the CSV files
    pub output_dir: PathBuf,

    pub pass_strategy: PassStrategy,

    /// Read buffer in front of each JSON cursor, in bytes
    pub read_buffer_size: usize,

    /// Rows between sink flushes
    pub flush_interval: u64,

    /// Records between progress notifications
    pub progress_interval: u64,

    /// Date used as "today" by the parcel validity filter
    pub reference_date: Option<NaiveDate>,

    /// Write a UTF-8 byte order mark before each header
    pub write_bom: bool,

    /// Exporters to run
    pub exporters: Vec<ExporterKind>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            dar_path: None,
            mat_path: None,
            dar_prefix: DEFAULT_DAR_PREFIX.to_string(),
            mat_prefix: DEFAULT_MAT_PREFIX.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            pass_strategy: PassStrategy::default(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            reference_date: None,
            write_bom: false,
            exporters: ExporterKind::ALL.to_vec(),
        }
    }
}

impl ConverterConfig {
    /// `<config dir>/datafordeler-converter/config.json`, when the platform has one
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load a JSON config file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ConverterError::configuration(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&text).map_err(|e| {
            ConverterError::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Defaults overlaid with a config file
    ///
    /// An explicit path must exist. Without one, the default config path is
    /// used when present.
    pub fn load_layered(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Loading config file {}", path.display());
            return Self::from_file(path);
        }

        match Self::default_config_path().filter(|path| path.is_file()) {
            Some(path) => {
                debug!("Loading config file {}", path.display());
                Self::from_file(&path)
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject settings no run could use
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(ConverterError::configuration("read_buffer_size must be greater than zero"));
        }
        if self.flush_interval == 0 {
            return Err(ConverterError::configuration("flush_interval must be greater than zero"));
        }
        if self.progress_interval == 0 {
            return Err(ConverterError::configuration(
                "progress_interval must be greater than zero",
            ));
        }
        if self.exporters.is_empty() {
            return Err(ConverterError::configuration("at least one exporter must be selected"));
        }
        if self.dar_prefix.is_empty() || self.mat_prefix.is_empty() {
            return Err(ConverterError::configuration("source prefixes must not be empty"));
        }
        Ok(())
    }

    /// Selected exporters in canonical order, without repeats
    pub fn selected_exporters(&self) -> Vec<ExporterKind> {
        ExporterKind::ALL
            .into_iter()
            .filter(|kind| self.exporters.contains(kind))
            .collect()
    }

    /// The configured reference date, or today's local date
    pub fn effective_reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn sink_options(&self) -> SinkOptions {
        SinkOptions {
            flush_interval: self.flush_interval,
            write_bom: self.write_bom,
        }
    }

    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Use explicit source documents instead of discovery
    pub fn with_sources(mut self, dar: impl Into<PathBuf>, mat: impl Into<PathBuf>) -> Self {
        self.dar_path = Some(dar.into());
        self.mat_path = Some(mat.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_pass_strategy(mut self, strategy: PassStrategy) -> Self {
        self.pass_strategy = strategy;
        self
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn with_exporters(mut self, exporters: impl IntoIterator<Item = ExporterKind>) -> Self {
        self.exporters = exporters.into_iter().collect();
        self
    }

    pub fn with_bom(mut self) -> Self {
        self.write_bom = true;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub fn with_flush_interval(mut self, rows: u64) -> Self {
        self.flush_interval = rows;
        self
    }

    pub fn with_progress_interval(mut self, records: u64) -> Self {
        self.progress_interval = records;
        self
    }
}
