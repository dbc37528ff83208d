//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of scan reports.
//! Each formatter writes to any `io::Write`; [`format_report`] targets stdout.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::write_csv;
pub use json_format::write_json;
pub use plain::{print_scan_header, print_success, print_warning, write_plain};

use crate::cli::OutputFormat;
use crate::report::ScanReport;
use std::io::{self, Write};

/// Write a report in the given format.
pub fn write_report<W: Write>(out: &mut W, report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => write_plain(out, report),
        OutputFormat::Json => write_json(out, report),
        OutputFormat::Csv => write_csv(out, report),
    }
}

/// Print a report to stdout.
pub fn format_report(report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, report, format)?;
    out.flush()
}
