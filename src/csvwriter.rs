use csv::{Terminator, Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::OutputTable;

/// Writes an `OutputTable` as comma-separated UTF-8 text: one header row,
/// one line per row, `\n` line endings, no index column.
pub struct CsvTableWriter {
    path: PathBuf,
    writer: Writer<File>,
    current_rows: usize,
}

impl CsvTableWriter {
    pub fn new(path: &Path) -> Result<Self> {
        let writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_path(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            current_rows: 0,
        })
    }

    pub fn write_table(&mut self, table: &OutputTable) -> Result<()> {
        // nothing extracted at all: leave the file empty
        if table.rows().is_empty() {
            return Ok(());
        }

        // with no columns each record is written as `""`, one line per row
        self.writer.write_record(table.columns())?;
        for row in table.rows() {
            self.writer.write_record(table.cells(row))?;
            self.current_rows += 1;
        }
        Ok(())
    }

    /// Flushes to disk and returns the path and number of data rows written.
    pub fn finalize(mut self) -> Result<(PathBuf, usize)> {
        self.writer.flush()?;
        Ok((self.path, self.current_rows))
    }
}

pub fn write_table(table: &OutputTable, path: &Path) -> Result<usize> {
    let mut writer = CsvTableWriter::new(path)?;
    writer.write_table(table)?;
    let (_, rows) = writer.finalize()?;
    Ok(rows)
}
