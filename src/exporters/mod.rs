//! The four CSV export pipelines
//!
//! Every exporter runs on its own worker thread with its own source cursor(s)
//! and its own sink. The only state exporters share is the read-only
//! [`SharedLookups`](crate::lookup::SharedLookups).

pub mod address_access;
pub mod address_specific;
pub mod post_code;
pub mod road_name;

use crate::constants::outputs;
use crate::error::Result;
use crate::lookup::SharedLookups;
use crate::lookup::builders::{BuildOptions, LookupNeeds};
use crate::models::ExportReport;
use crate::progress::{ProgressObserver, ProgressTicker};
use crate::scanner::ListScanner;
use crate::sink::{CsvSink, SinkOptions};
use crate::storage::{SinkProvider, SinkWriter, SourceDocument, SourceProvider, SourceReader, open_scanner};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// One of the CSV outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExporterKind {
    RoadName,
    PostCode,
    AddressAccess,
    AddressSpecific,
}

impl ExporterKind {
    pub const ALL: [ExporterKind; 4] = [
        ExporterKind::RoadName,
        ExporterKind::PostCode,
        ExporterKind::AddressAccess,
        ExporterKind::AddressSpecific,
    ];

    pub fn output_file(&self) -> &'static str {
        match self {
            ExporterKind::RoadName => outputs::ROAD_NAME_FILE,
            ExporterKind::PostCode => outputs::POST_CODE_FILE,
            ExporterKind::AddressAccess => outputs::ADDRESS_ACCESS_FILE,
            ExporterKind::AddressSpecific => outputs::ADDRESS_SPECIFIC_FILE,
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            ExporterKind::RoadName => outputs::ROAD_NAME_HEADER,
            ExporterKind::PostCode => outputs::POST_CODE_HEADER,
            ExporterKind::AddressAccess => outputs::ADDRESS_ACCESS_HEADER,
            ExporterKind::AddressSpecific => outputs::ADDRESS_SPECIFIC_HEADER,
        }
    }

    /// Shared lookups this exporter reads
    pub fn needs(&self) -> LookupNeeds {
        match self {
            ExporterKind::RoadName => LookupNeeds {
                road_segments: true,
                ..Default::default()
            },
            ExporterKind::PostCode => LookupNeeds {
                postal_codes: true,
                ..Default::default()
            },
            ExporterKind::AddressAccess => LookupNeeds {
                postal_codes: true,
                road_segments: true,
                parcels: true,
            },
            ExporterKind::AddressSpecific => LookupNeeds::default(),
        }
    }

    /// Union of the lookups needed by `kinds`
    pub fn combined_needs(kinds: &[ExporterKind]) -> LookupNeeds {
        kinds.iter().fold(LookupNeeds::default(), |acc, kind| {
            let needs = kind.needs();
            LookupNeeds {
                postal_codes: acc.postal_codes || needs.postal_codes,
                road_segments: acc.road_segments || needs.road_segments,
                parcels: acc.parcels || needs.parcels,
            }
        })
    }

    /// Run the exporter to completion
    pub fn run(self, ctx: &ExportContext) -> Result<ExportReport> {
        let start = Instant::now();
        let rows = match self {
            ExporterKind::RoadName => road_name::export(ctx),
            ExporterKind::PostCode => post_code::export(ctx),
            ExporterKind::AddressAccess => address_access::export(ctx),
            ExporterKind::AddressSpecific => address_specific::export(ctx),
        }
        .map_err(|e| e.in_exporter(self.to_string()))?;

        let duration = start.elapsed();
        info!(
            "Wrote {} rows to {} in {:.2}s",
            rows,
            self.output_file(),
            duration.as_secs_f64()
        );

        Ok(ExportReport {
            exporter: self,
            file: self.output_file().to_string(),
            rows,
            duration,
        })
    }
}

impl fmt::Display for ExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExporterKind::RoadName => "RoadName",
            ExporterKind::PostCode => "PostCode",
            ExporterKind::AddressAccess => "AddressAccess",
            ExporterKind::AddressSpecific => "AddressSpecific",
        };
        f.write_str(name)
    }
}

/// Everything an exporter needs, cheap to clone into a worker
#[derive(Clone)]
pub struct ExportContext {
    pub sources: Arc<dyn SourceProvider>,
    pub sinks: Arc<dyn SinkProvider>,
    pub lookups: Arc<SharedLookups>,
    pub options: BuildOptions,
    pub sink_options: SinkOptions,
    pub observer: Arc<dyn ProgressObserver>,
}

impl ExportContext {
    pub(crate) fn scanner(&self, document: SourceDocument) -> Result<ListScanner<SourceReader>> {
        open_scanner(self.sources.as_ref(), document, self.options.buffer_size)
    }

    pub(crate) fn sink(&self, kind: ExporterKind) -> Result<CsvSink<SinkWriter>> {
        let name = kind.output_file();
        CsvSink::create(name, self.sinks.create(name)?, kind.header(), self.sink_options)
    }

    pub(crate) fn ticker(&self, task: &str) -> ProgressTicker {
        ProgressTicker::start(self.observer.clone(), task, self.options.progress_interval)
    }
}
