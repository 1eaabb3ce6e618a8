//! Output sinks for status and timing.
//!
//! Every run writes to three channels:
//! - **console**: per-iteration and summary lines for the operator
//! - **log**: everything the console sees plus setup and teardown narration
//! - **report**: a banner followed by one CSV row per processed chunk
//!
//! Writes are synchronous and flushed line by line so a crashed or killed run
//! still leaves a usable trail behind.

use crate::error::Result;
use crate::fileio::create_file;
use crate::pipeline::IterationRecord;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;

/// Column header of the timing report
pub const REPORT_HEADER: &str = "iteration,data size(bytes),buffer size(bytes),time(ns),time(s)";

/// Sinks drop (and so close) in declaration order: console, report, log
pub struct Instrumentation {
    console: Box<dyn Write>,
    report: Box<dyn Write>,
    log: Box<dyn Write>,
}

impl Instrumentation {
    pub fn new(console: Box<dyn Write>, log: Box<dyn Write>, report: Box<dyn Write>) -> Self {
        Self {
            console,
            report,
            log,
        }
    }

    /// Console on stdout, log and report created (truncated) at the given paths
    pub fn open(report_path: &Path, log_path: &Path) -> Result<Self> {
        let report = create_file("report", report_path)?;
        let log = create_file("log", log_path)?;
        Ok(Self::new(
            Box::new(io::stdout()),
            Box::new(log),
            Box::new(report),
        ))
    }

    pub fn console(&mut self, line: impl Display) -> Result<()> {
        write_line(self.console.as_mut(), line)
    }

    pub fn log(&mut self, line: impl Display) -> Result<()> {
        write_line(self.log.as_mut(), line)
    }

    /// Same line to log and console, log first
    pub fn console_and_log(&mut self, line: impl Display) -> Result<()> {
        let line = line.to_string();
        self.log(&line)?;
        self.console(&line)
    }

    /// Free-form report line, used for the setup banner
    pub fn report(&mut self, line: impl Display) -> Result<()> {
        write_line(self.report.as_mut(), line)
    }

    pub fn report_header(&mut self) -> Result<()> {
        self.report(REPORT_HEADER)
    }

    /// Append one CSV row for a processed chunk
    pub fn record(&mut self, record: &IterationRecord) -> Result<()> {
        self.report(format_args!(
            "{},{},{},{},{:.9}",
            record.index,
            record.bytes_read,
            record.buffer_capacity,
            record.elapsed_nanos,
            record.elapsed_seconds
        ))
    }

    /// Flush and release all three sinks
    pub fn close(mut self) -> Result<()> {
        self.console.flush()?;
        self.report.flush()?;
        self.log.flush()?;
        Ok(())
    }
}

fn write_line(sink: &mut dyn Write, line: impl Display) -> Result<()> {
    writeln!(sink, "{}", line)?;
    sink.flush()?;
    Ok(())
}
