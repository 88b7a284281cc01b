//! Result document persistence
//!
//! All records of a run are kept in memory and the whole sequence is
//! rewritten as one pretty-printed JSON array on every flush. Writes go to a
//! temporary file that is then renamed over the target, so readers never see
//! a half-written document.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::OutputRecord;
use crate::utils::error::SinkError;
use crate::utils::sanitize_filename;

/// Result file for a lookback of `months_back` months: `{prefix}_{N}months.json`
pub fn output_path(dir: &Path, prefix: &str, months_back: u32) -> PathBuf {
    let prefix = sanitize_filename(prefix);
    dir.join(format!("{prefix}_{months_back}months.json"))
}

/// Append-only accumulator of output records
#[derive(Debug, Clone)]
pub struct ResultSink {
    records: Vec<OutputRecord>,
    /// Posts appended per incremental flush
    flush_every: usize,
    /// Posts appended since the last flush
    pending: usize,
}

impl ResultSink {
    pub fn new(flush_every: usize) -> Self {
        Self {
            records: Vec::new(),
            flush_every: flush_every.max(1),
            pending: 0,
        }
    }

    /// Add the records produced by one post
    pub fn append(&mut self, records: Vec<OutputRecord>) {
        self.records.extend(records);
        self.pending += 1;
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether enough posts arrived since the last flush
    pub fn should_flush(&self) -> bool {
        self.pending >= self.flush_every
    }

    /// Overwrite `path` with every record collected so far
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the directory, temp file or rename fails, or
    /// the records cannot be serialized.
    pub fn flush(&mut self, path: &Path) -> Result<(), SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SinkError::io(parent, e))?;
        }

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let file = File::create(&temp_path).map_err(|e| SinkError::io(&temp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.records)?;
        writer.flush().map_err(|e| SinkError::io(&temp_path, e))?;
        drop(writer);

        fs::rename(&temp_path, path).map_err(|e| SinkError::io(path, e))?;

        self.pending = 0;
        tracing::debug!(path = %path.display(), records = self.records.len(), "Results flushed");
        Ok(())
    }

    /// Read a previously flushed result document
    pub fn load(path: &Path) -> Result<Vec<OutputRecord>, SinkError> {
        let file = File::open(path).map_err(|e| SinkError::io(path, e))?;
        let reader = BufReader::new(file);
        let records = serde_json::from_reader(reader)?;

        tracing::debug!(path = %path.display(), "Results loaded");
        Ok(records)
    }
}

impl Default for ResultSink {
    fn default() -> Self {
        Self::new(1)
    }
}
