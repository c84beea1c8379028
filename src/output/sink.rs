//! Append-only results file

use super::formatter::{ReportContext, ReportFormatter};
use crate::error::{AppError, Result};
use crate::models::FrequencyResult;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Appends one formatted record per swept frequency.
///
/// Records are flushed as they arrive so an interrupted sweep keeps
/// everything written so far. Existing file content is never truncated.
pub struct ResultFileSink {
    path: PathBuf,
    file: File,
    formatter: Box<dyn ReportFormatter>,
    context: ReportContext,
    written: usize,
}

impl ResultFileSink {
    pub fn open(path: impl AsRef<Path>, formatter: Box<dyn ReportFormatter>, context: ReportContext) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::io(format!("Cannot open results file {}: {}", path.display(), e)))?;

        Ok(Self {
            path,
            file,
            formatter,
            context,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records appended through this sink
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn append(&mut self, result: &FrequencyResult) -> Result<()> {
        let record = self.formatter.format_record(result, &self.context)?;
        self.file
            .write_all(record.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|e| AppError::io(format!("Cannot write to results file {}: {}", self.path.display(), e)))?;
        self.written += 1;
        Ok(())
    }
}
