//! Command execution for the converter CLI
//!
//! Sets up logging, resolves the layered configuration, runs the conversion
//! and prints the summary.

use crate::cli::args::Args;
use crate::config::ConverterConfig;
use crate::models::RunReport;
use crate::processor::ConversionProcessor;
use crate::progress::{NoopObserver, ProgressBars, ProgressObserver, TracingObserver};
use crate::storage::{FileSources, SourceDocument};
use anyhow::{Context, Result};
use colored::*;
use indicatif::HumanBytes;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Main command runner
///
/// 1. Set up logging and configuration
/// 2. Resolve the source documents
/// 3. Run the conversion with progress reporting
/// 4. Print the summary
pub async fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let config = load_configuration(&args)?;
    debug!("Resolved configuration: {:?}", config);

    if args.list_sources {
        return list_sources(&config);
    }

    let observer: Arc<dyn ProgressObserver> = if args.quiet {
        Arc::new(NoopObserver)
    } else if args.show_progress_bars() {
        Arc::new(ProgressBars::new())
    } else {
        Arc::new(TracingObserver)
    };

    let processor = ConversionProcessor::from_config(config)
        .context("Failed to prepare conversion")?
        .with_observer(observer);

    if !args.quiet {
        print_banner(processor.config());
    }

    info!("Starting conversion");
    let report = processor.run().await.context("Conversion failed")?;

    if !args.quiet {
        print_summary(&report);
    }
    Ok(())
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("datafordeler_converter={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Defaults, then the config file, then command-line overrides
fn load_configuration(args: &Args) -> Result<ConverterConfig> {
    let mut config = ConverterConfig::load_layered(args.config.as_deref())
        .context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Apply CLI argument overrides to configuration
fn apply_cli_overrides(config: &mut ConverterConfig, args: &Args) {
    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(path) = &args.dar {
        config.dar_path = Some(path.clone());
    }
    if let Some(path) = &args.mat {
        config.mat_path = Some(path.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(strategy) = args.strategy {
        config.pass_strategy = strategy;
    }
    if let Some(date) = args.reference_date {
        config.reference_date = Some(date);
    }
    if !args.only.is_empty() {
        config.exporters = args.only.clone();
    }
    if args.bom {
        config.write_bom = true;
    }
}

fn list_sources(config: &ConverterConfig) -> Result<()> {
    let sources = FileSources::from_config(config).context("Failed to resolve source documents")?;

    for document in [SourceDocument::Dar, SourceDocument::Mat] {
        println!("  {}", source_line(document, sources.path(document)));
    }
    Ok(())
}

/// Resolved export with its size on disk
fn source_line(document: SourceDocument, path: &Path) -> String {
    let size = fs::metadata(path)
        .map(|meta| HumanBytes(meta.len()).to_string())
        .unwrap_or_else(|_| "unreadable".to_string());
    format!(
        "{} {} ({})",
        format!("{}:", document).bright_cyan(),
        path.display(),
        size
    )
}

fn print_banner(config: &ConverterConfig) {
    println!("{}", "Starting registry conversion".bright_green().bold());
    println!(
        "  {} {}",
        "Output:".bright_cyan(),
        config.output_dir.display()
    );
    println!(
        "  {} {:?}",
        "Strategy:".bright_cyan(),
        config.pass_strategy
    );
    println!(
        "  {} {}",
        "Reference date:".bright_cyan(),
        config.effective_reference_date()
    );
}

fn print_summary(report: &RunReport) {
    let lookups = &report.lookups;

    println!("\n{}", "Conversion Summary".bright_green().bold());
    println!(
        "  {} {} postal codes, {} road segments, {} parcels in {:.2}s",
        "Lookups:".bright_cyan(),
        lookups.postal_codes.to_string().bright_white(),
        lookups.road_segments.to_string().bright_white(),
        lookups.parcels.to_string().bright_white(),
        lookups.duration.as_secs_f64()
    );
    if lookups.parcels_unresolved > 0 {
        println!(
            "  {} {}",
            "Parcels without district:".bright_yellow(),
            lookups.parcels_unresolved.to_string().bright_yellow()
        );
    }
    for export in &report.exports {
        println!(
            "  {} {} rows in {:.2}s",
            format!("{}:", export.file).bright_cyan(),
            export.rows.to_string().bright_white().bold(),
            export.duration.as_secs_f64()
        );
    }
    println!(
        "  {} {}",
        "Total rows:".bright_cyan(),
        report.total_rows().to_string().bright_white().bold()
    );
    println!(
        "  {} {:.2}s",
        "Time elapsed:".bright_cyan(),
        report.total_duration.as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PassStrategy;
    use crate::exporters::ExporterKind;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_source_line_reports_size() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("DAR_20240615.json");
        fs::write(&path, vec![b' '; 1536]).unwrap();

        let line = source_line(SourceDocument::Dar, &path);

        assert!(line.contains("DAR:"));
        assert!(line.contains("DAR_20240615.json"));
        assert!(line.ends_with("(1.50 KiB)"), "{line}");
    }

    #[test]
    fn test_source_line_for_unreadable_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("MAT_missing.json");

        let line = source_line(SourceDocument::Mat, &path);

        assert!(line.ends_with("(unreadable)"), "{line}");
    }

    #[test]
    fn test_apply_cli_overrides() {
        let args = Args::try_parse_from([
            "datafordeler-converter",
            "--input-dir",
            "/data/exports",
            "-o",
            "/data/csv",
            "--strategy",
            "reopen",
            "--only",
            "road-name",
            "--bom",
        ])
        .unwrap();
        let mut config = ConverterConfig::default();

        apply_cli_overrides(&mut config, &args);

        assert_eq!(config.input_dir, PathBuf::from("/data/exports"));
        assert_eq!(config.output_dir, PathBuf::from("/data/csv"));
        assert_eq!(config.pass_strategy, PassStrategy::Reopen);
        assert_eq!(config.exporters, vec![ExporterKind::RoadName]);
        assert!(config.write_bom);
        assert!(config.dar_path.is_none());
    }

    #[test]
    fn test_overrides_keep_config_values_when_absent() {
        let args = Args::try_parse_from(["datafordeler-converter"]).unwrap();
        let mut config = ConverterConfig::default()
            .with_bom()
            .with_exporters([ExporterKind::PostCode]);

        apply_cli_overrides(&mut config, &args);

        assert!(config.write_bom);
        assert_eq!(config.exporters, vec![ExporterKind::PostCode]);
    }

    #[test]
    fn test_load_configuration_reads_explicit_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"pass_strategy": "reopen", "flush_interval": 50}"#).unwrap();

        let args = Args::try_parse_from([
            "datafordeler-converter",
            "--config",
            path.to_str().unwrap(),
            "--strategy",
            "single-pass",
        ])
        .unwrap();

        let config = load_configuration(&args).unwrap();

        assert_eq!(config.flush_interval, 50);
        assert_eq!(config.pass_strategy, PassStrategy::SinglePass);
    }
}
