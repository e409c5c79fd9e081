//! Command-line argument definitions
//!
//! Every flag is optional. Values given here override the config file, which
//! overrides the built-in defaults.

use crate::config::PassStrategy;
use crate::exporters::ExporterKind;
use chrono::NaiveDate;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Converts Danish DAR (addresses) and MAT (cadastre) registry JSON exports
/// into the four denormalized CSV files RoadName, PostCode, AddressAccess and
/// AddressSpecific.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "datafordeler-converter",
    version,
    about = "Convert Danish DAR/MAT registry JSON exports to denormalized CSV files"
)]
pub struct Args {
    /// Directory searched for the newest DAR_*.json and MAT_*.json exports
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// DAR export to read instead of searching the input directory
    #[arg(long, value_name = "FILE")]
    pub dar: Option<PathBuf>,

    /// MAT export to read instead of searching the input directory
    #[arg(long, value_name = "FILE")]
    pub mat: Option<PathBuf>,

    /// Directory receiving the CSV files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// JSON config file (default: <config dir>/datafordeler-converter/config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How each document is read: one combined pass, or one cursor per list
    #[arg(long, value_enum)]
    pub strategy: Option<PassStrategy>,

    /// Date treated as today when filtering parcels by validity
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub reference_date: Option<NaiveDate>,

    /// Run only these exporters
    #[arg(long, value_enum, value_delimiter = ',', value_name = "NAME")]
    pub only: Vec<ExporterKind>,

    /// Write a UTF-8 byte order mark before each CSV header
    #[arg(long)]
    pub bom: bool,

    /// Print the resolved source documents and exit
    #[arg(long)]
    pub list_sources: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and hide progress
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are drawn only when nothing else is logging progress
    pub fn show_progress_bars(&self) -> bool {
        !self.quiet && self.verbose == 0
    }
}
