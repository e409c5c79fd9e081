//! Incremental CSV output
//!
//! Every output file is UTF-8, `;` delimited and `\n` terminated, with no
//! quoting or escaping. The header line is written when the sink is created.

use crate::constants::{DEFAULT_FLUSH_INTERVAL, outputs::CSV_DELIMITER};
use crate::error::Result;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A record that renders as one CSV row
pub trait CsvRecord {
    fn write_row<W: Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()>;
}

/// Options shared by every sink of a run
#[derive(Debug, Clone, Copy)]
pub struct SinkOptions {
    pub flush_interval: u64,
    pub write_bom: bool,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            write_bom: false,
        }
    }
}

/// Row writer for one output file
pub struct CsvSink<W: Write> {
    name: String,
    writer: csv::Writer<W>,
    flush_interval: u64,
    rows: u64,
}

impl<W: Write> CsvSink<W> {
    /// Wrap `output` and write the header line
    pub fn create(
        name: impl Into<String>,
        mut output: W,
        header: &[&str],
        options: SinkOptions,
    ) -> Result<Self> {
        if options.write_bom {
            output.write_all(UTF8_BOM)?;
        }

        let mut writer = WriterBuilder::new()
            .delimiter(CSV_DELIMITER)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(output);
        writer.write_record(header)?;

        Ok(Self {
            name: name.into(),
            writer,
            flush_interval: options.flush_interval.max(1),
            rows: 0,
        })
    }

    /// Append one data row, flushing every `flush_interval` rows
    pub fn write<R: CsvRecord>(&mut self, record: &R) -> Result<()> {
        record.write_row(&mut self.writer)?;
        self.rows += 1;

        if self.rows % self.flush_interval == 0 {
            self.writer.flush()?;
        }
        Ok(())
    }

    /// Flush and close the sink, returning the data row count
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        let mut output = self.writer.into_inner().map_err(|e| e.into_error())?;
        output.flush()?;

        debug!("Closed {} after {} rows", self.name, self.rows);
        Ok(self.rows)
    }
}
