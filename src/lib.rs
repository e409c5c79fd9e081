//! Datafordeler Converter Library
//!
//! Streams the Danish national address registry (DAR) and cadastral registry
//! (MAT) JSON exports and writes four denormalized, `;`-delimited CSV files:
//!
//! - `RoadName.csv`: named roads with municipality and road code
//! - `PostCode.csv`: postal codes and district names
//! - `AddressAccess.csv`: house numbers joined with postal, road, parcel and
//!   coordinate data
//! - `AddressSpecific.csv`: unit addresses (floor and door)
//!
//! Registry exports run to many gigabytes, so documents are never loaded
//! whole: a forward-only scanner hands out one list element at a time.
//! Lookup tables are built first, then frozen and shared read-only by the
//! exporters, which run concurrently.
//!
//! ```no_run
//! use datafordeler_converter::{ConverterConfig, convert};
//!
//! # async fn example() -> datafordeler_converter::Result<()> {
//! let config = ConverterConfig::default()
//!     .with_input_dir("/data/exports")
//!     .with_output_dir("/data/csv");
//! let report = convert(config).await?;
//! println!("{} rows written", report.total_rows());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod enrichment;
pub mod error;
pub mod exporters;
pub mod lookup;
pub mod models;
pub mod processor;
pub mod progress;
pub mod scanner;
pub mod sink;
pub mod storage;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::{ConverterConfig, PassStrategy};
pub use error::{ConverterError, Result};
pub use exporters::ExporterKind;
pub use models::{ExportReport, LookupReport, RunReport};
pub use processor::ConversionProcessor;
pub use storage::{
    DirectorySink, FileSources, MemorySinks, MemorySources, SinkProvider, SourceDocument,
    SourceProvider,
};

/// Convert the configured source documents into CSV files in the output directory
pub async fn convert(config: ConverterConfig) -> Result<RunReport> {
    ConversionProcessor::from_config(config)?.run().await
}
