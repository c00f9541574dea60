//! Flat delimited-text export.
//!
//! Output is lossy but always well formed for spreadsheets: every cell is a
//! quoted string. Embedded quote and delimiter characters are written as-is,
//! so a value containing `"` breaks the cell. This is a known limitation of
//! the format, not escaped here.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::record::Record;

pub const DEFAULT_DELIMITER: char = ',';

/// Render records as delimited text, columns taken from the first record.
///
/// Returns `None` for an empty collection: there is nothing to write.
pub fn export_flat(records: &[Record], delimiter: char) -> Option<String> {
    let first = records.first()?;
    let columns: Vec<&str> = first.keys().collect();
    let sep = delimiter.to_string();

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(columns.join(&sep));
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|col| {
                let cell = record.get(col).map(|v| v.to_string()).unwrap_or_default();
                format!("\"{cell}\"")
            })
            .collect();
        lines.push(row.join(&sep));
    }
    Some(lines.join("\n"))
}

/// Destination for an exported blob ("save to disk" / "download").
pub trait ExportSink {
    /// Store `contents` under `filename` (extension included). Returns
    /// where it ended up.
    fn save(&mut self, filename: &str, contents: &str) -> Result<PathBuf>;
}

/// Writes exports into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ExportSink for FileSink {
    fn save(&mut self, filename: &str, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, contents)?;
        info!("wrote {} bytes to {}", contents.len(), path.display());
        Ok(path)
    }
}

/// Export records and hand them to `sink` as `<filename>.csv`.
///
/// An empty collection is a no-op: the sink is not called and `None` is
/// returned.
pub fn export_to_sink(
    records: &[Record],
    filename: &str,
    delimiter: char,
    sink: &mut dyn ExportSink,
) -> Result<Option<PathBuf>> {
    let Some(contents) = export_flat(records, delimiter) else {
        return Ok(None);
    };
    sink.save(&format!("{filename}.csv"), &contents).map(Some)
}
