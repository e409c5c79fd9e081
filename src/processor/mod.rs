//! Conversion engine.
//!
//! Runs a conversion in two phases separated by a strict barrier:
//!
//! 1. **Lookups**: the DAR pass (postal codes, road segments) and the MAT pass
//!    (ownership districts, parcels) are independent and run concurrently on
//!    blocking worker threads.
//! 2. **Export**: once both tables exist they are frozen behind an `Arc` and
//!    every selected exporter runs on its own blocking worker, with its own
//!    source cursor and its own sink.
//!
//! Any worker failure fails the run.

#[cfg(test)]
pub mod tests;

use crate::config::ConverterConfig;
use crate::error::{ConverterError, Result};
use crate::exporters::{ExportContext, ExporterKind};
use crate::lookup::SharedLookups;
use crate::lookup::builders::{BuildOptions, build_dar_lookups, build_mat_lookups};
use crate::models::{LookupReport, RunReport};
use crate::progress::{ProgressObserver, TracingObserver, log_memory_usage};
use crate::storage::{DirectorySink, FileSources, SinkProvider, SourceDocument, SourceProvider};

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{self, JoinHandle};
use tracing::{error, info};

/// Orchestrates lookup building and the export fan-out
pub struct ConversionProcessor {
    config: ConverterConfig,
    sources: Arc<dyn SourceProvider>,
    sinks: Arc<dyn SinkProvider>,
    observer: Arc<dyn ProgressObserver>,
}

impl ConversionProcessor {
    pub fn new(
        config: ConverterConfig,
        sources: Arc<dyn SourceProvider>,
        sinks: Arc<dyn SinkProvider>,
    ) -> Self {
        Self {
            config,
            sources,
            sinks,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Processor reading the configured source files and writing to the
    /// configured output directory
    pub fn from_config(config: ConverterConfig) -> Result<Self> {
        config.validate()?;
        let sources = FileSources::from_config(&config)?;
        let sinks = DirectorySink::new(&config.output_dir)?;
        Ok(Self::new(config, Arc::new(sources), Arc::new(sinks)))
    }

    /// Report progress to `observer` instead of the log
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Run the conversion to completion
    pub async fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        let start = Instant::now();

        let exporters = self.config.selected_exporters();
        let options = BuildOptions::from_config(&self.config);
        info!(
            "Converting with {:?} strategy, reference date {}",
            options.strategy, options.reference_date
        );
        info!("  DAR: {}", self.sources.describe(SourceDocument::Dar));
        info!("  MAT: {}", self.sources.describe(SourceDocument::Mat));

        let (lookups, lookup_report) = self.build_lookups(&exporters, options).await?;
        log_memory_usage("after lookups");

        let ctx = ExportContext {
            sources: self.sources.clone(),
            sinks: self.sinks.clone(),
            lookups: Arc::new(lookups),
            options,
            sink_options: self.config.sink_options(),
            observer: self.observer.clone(),
        };

        info!("Running {} exporters", exporters.len());
        let handles = exporters.iter().map(|&kind| {
            let ctx = ctx.clone();
            worker(task::spawn_blocking(move || kind.run(&ctx)))
        });

        let mut exports = Vec::with_capacity(exporters.len());
        let mut first_error = None;
        for result in join_all(handles).await {
            match result {
                Ok(report) => exports.push(report),
                Err(e) => {
                    error!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }
        log_memory_usage("after export");

        let report = RunReport {
            lookups: lookup_report,
            exports,
            total_duration: start.elapsed(),
        };
        info!(
            "Conversion finished: {} rows in {:.2}s",
            report.total_rows(),
            report.total_duration.as_secs_f64()
        );
        Ok(report)
    }

    async fn build_lookups(
        &self,
        exporters: &[ExporterKind],
        options: BuildOptions,
    ) -> Result<(SharedLookups, LookupReport)> {
        let start = Instant::now();
        let needs = ExporterKind::combined_needs(exporters);

        let dar_task = {
            let sources = self.sources.clone();
            let observer = self.observer.clone();
            worker(task::spawn_blocking(move || {
                build_dar_lookups(sources.as_ref(), needs, &options, observer)
            }))
        };
        let mat_task = {
            let sources = self.sources.clone();
            let observer = self.observer.clone();
            worker(task::spawn_blocking(move || {
                build_mat_lookups(sources.as_ref(), needs, &options, observer)
            }))
        };

        let (dar, mat) = tokio::try_join!(dar_task, mat_task)?;

        let report = LookupReport {
            postal_codes: dar.postal_codes.len(),
            road_segments: dar.road_segments.len(),
            ownership_districts: mat.ownership_districts,
            parcels: mat.parcels.len(),
            parcels_not_current: mat.not_current,
            parcels_unresolved: mat.unresolved,
            duplicate_keys: dar.postal_codes.duplicates()
                + dar.road_segments.duplicates()
                + mat.parcels.duplicates(),
            duration: start.elapsed(),
        };
        info!(
            "Lookups ready in {:.2}s: {} postal codes, {} road segments, {} parcels",
            report.duration.as_secs_f64(),
            report.postal_codes,
            report.road_segments,
            report.parcels
        );

        Ok((
            SharedLookups::new(dar.postal_codes, dar.road_segments, mat.parcels),
            report,
        ))
    }
}

/// Await a blocking worker, folding a panicked or cancelled task into the error type
async fn worker<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    handle.await.map_err(|e| ConverterError::TaskFailed {
        reason: e.to_string(),
    })?
}
