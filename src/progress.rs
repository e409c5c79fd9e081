//! Progress reporting hooks
//!
//! Long passes report through a [`ProgressObserver`] instead of printing.
//! The CLI installs spinners; library callers get log lines or nothing.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sysinfo::System;
use tracing::{debug, info};

/// Receives progress of the named tasks of a run
///
/// Tasks are identified by name, e.g. `"DAR lookups"` or `"AddressAccess.csv"`.
/// Calls may arrive concurrently from several worker threads.
pub trait ProgressObserver: Send + Sync {
    fn started(&self, _task: &str) {}

    /// `processed` is the running total of records for the task
    fn progress(&self, _task: &str, _processed: u64) {}

    fn finished(&self, _task: &str, _processed: u64, _elapsed: Duration) {}
}

/// Ignores all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Reports progress as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn started(&self, task: &str) {
        debug!("{}: started", task);
    }

    fn progress(&self, task: &str, processed: u64) {
        debug!("{}: {} records", task, processed);
    }

    fn finished(&self, task: &str, processed: u64, elapsed: Duration) {
        info!(
            "{}: {} records in {:.2}s",
            task,
            processed,
            elapsed.as_secs_f64()
        );
    }
}

/// One spinner per task, drawn on stderr
pub struct ProgressBars {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressBars {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {prefix:.cyan.bold} {pos} records {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
    }

    fn with_bar(&self, task: &str, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(bar) = bars.get(task) {
                f(bar);
            }
        }
    }
}

impl Default for ProgressBars {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ProgressBars {
    fn started(&self, task: &str) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(Self::style());
        bar.set_prefix(task.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(task.to_string(), bar);
        }
    }

    fn progress(&self, task: &str, processed: u64) {
        self.with_bar(task, |bar| bar.set_position(processed));
    }

    fn finished(&self, task: &str, processed: u64, elapsed: Duration) {
        self.with_bar(task, |bar| {
            bar.set_position(processed);
            bar.finish_with_message(format!("done in {:.1}s", elapsed.as_secs_f64()));
        });
    }
}

/// Counts records of one task and notifies the observer every `interval`
pub struct ProgressTicker {
    observer: Arc<dyn ProgressObserver>,
    task: String,
    interval: u64,
    processed: u64,
    started: Instant,
}

impl ProgressTicker {
    pub fn start(observer: Arc<dyn ProgressObserver>, task: impl Into<String>, interval: u64) -> Self {
        let task = task.into();
        observer.started(&task);
        Self {
            observer,
            task,
            interval: interval.max(1),
            processed: 0,
            started: Instant::now(),
        }
    }

    pub fn tick(&mut self) {
        self.processed += 1;
        if self.processed % self.interval == 0 {
            self.observer.progress(&self.task, self.processed);
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Report completion and return the elapsed time
    pub fn finish(self) -> Duration {
        let elapsed = self.started.elapsed();
        self.observer.finished(&self.task, self.processed, elapsed);
        elapsed
    }
}

/// Log system memory use at a phase boundary
pub fn log_memory_usage(phase: &str) {
    let mut system = System::new();
    system.refresh_memory();

    let used_mb = system.used_memory() / 1024 / 1024;
    let total_mb = system.total_memory() / 1024 / 1024;
    info!("Memory after {}: {} MB used of {} MB", phase, used_mb, total_mb);
}
