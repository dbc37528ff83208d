//! JSON output formatting.

use crate::report::ScanReport;
use std::io::{self, Write};

/// Write the report as pretty-printed JSON.
pub fn write_json<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}
