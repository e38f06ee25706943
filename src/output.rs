//! Output sinks for ranked rows.
//!
//! A sink receives the header first, then the whole data block, mirroring
//! how a spreadsheet is filled with two range updates. The A1 ranges of
//! those two updates are reported back to the caller.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::models::{Cell, Ranking};

pub trait RowSink {
    fn write_header(&mut self, header: &[String]) -> Result<()>;

    fn write_rows(&mut self, rows: &[Vec<Cell>]) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Hand a ranking to a sink: header, data block, finish.
///
/// Returns the A1 ranges the two blocks occupy, sized from the ranking's
/// own width rather than a fixed column count.
pub fn write_ranking<S: RowSink + ?Sized>(sink: &mut S, ranking: &Ranking) -> Result<SheetRanges> {
    sink.write_header(&ranking.header)?;
    sink.write_rows(&ranking.rows)?;
    sink.finish()?;
    Ok(sheet_ranges(ranking.header.len(), ranking.rows.len()))
}

// ============================================================================
// CSV
// ============================================================================

/// Plain CSV: header row plus data rows, no formatting.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV output {}", path.display()))?;
        Ok(Self { writer })
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn write_header(&mut self, header: &[String]) -> Result<()> {
        self.writer
            .write_record(header)
            .context("Failed to write CSV header")
    }

    fn write_rows(&mut self, rows: &[Vec<Cell>]) -> Result<()> {
        for row in rows {
            self.writer
                .write_record(row.iter().map(|cell| cell.to_string()))
                .context("Failed to write CSV row")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush CSV output")
    }
}

// ============================================================================
// Spreadsheet Ranges
// ============================================================================

/// Spreadsheet column name for a 0-based index: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A1 ranges a spreadsheet sink updates for a table of `width` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRanges {
    pub header: String,
    pub data: String,
}

pub fn sheet_ranges(width: usize, row_count: usize) -> SheetRanges {
    let last = column_letter(width.saturating_sub(1));
    SheetRanges {
        header: format!("A1:{}1", last),
        data: format!("A2:{}{}", last, row_count + 1),
    }
}
