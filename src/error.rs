//! Error handling for registry conversion.
//!
//! Structural problems in the input (a missing list, a list that is not an
//! array) and join misses are not errors; they are logged and absorbed where
//! they occur. Everything in this enum aborts the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON in {document}: {source}")]
    Json {
        document: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("No {document} source document found in {dir} (prefix '{prefix}')")]
    SourceNotFound {
        document: String,
        dir: PathBuf,
        prefix: String,
    },

    #[error("Worker task failed: {reason}")]
    TaskFailed { reason: String },

    #[error("{exporter} export failed: {source}")]
    Export {
        exporter: String,
        #[source]
        source: Box<ConverterError>,
    },
}

impl ConverterError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn json(document: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            document: document.into(),
            source,
        }
    }

    /// Attach the failing exporter's name to an error
    pub fn in_exporter(self, exporter: impl Into<String>) -> Self {
        Self::Export {
            exporter: exporter.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConverterError>;
