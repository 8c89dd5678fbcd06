// ============================================================
// Layer 6: JSONL Writer
// ============================================================
// The output file is opened once per run and written one line
// per record. The row counter lives here and is checked after
// every single write, so a cap of N always truncates at the
// same record regardless of file boundaries.
//
// Closing:
//   - normal end and row-cap stop → finish() flushes explicitly
//     and reports flush errors
//   - error exit → the writer is dropped and BufWriter flushes
//     what was already written (partial lines are not retracted)

use std::{
    fs::File,
    io::{BufWriter, Write},
    ops::ControlFlow,
    path::{Path, PathBuf},
};

use crate::domain::{error::ConvertError, record::Record, traits::RecordSink};

pub struct JsonlWriter<W: Write = BufWriter<File>> {
    out:          W,
    path:         PathBuf,
    rows_written: usize,
    /// 0 = unbounded
    max_rows:     usize,
}

impl JsonlWriter<BufWriter<File>> {
    /// Create (truncate) the output file
    pub fn create(path: &Path, max_rows: usize) -> Result<Self, ConvertError> {
        let file = File::create(path).map_err(|e| ConvertError::io(path, e))?;
        tracing::debug!("Opened output '{}'", path.display());
        Ok(Self::new(BufWriter::new(file), path, max_rows))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(out: W, path: impl Into<PathBuf>, max_rows: usize) -> Self {
        Self {
            out,
            path: path.into(),
            rows_written: 0,
            max_rows,
        }
    }

    pub fn cap_reached(&self) -> bool {
        self.max_rows > 0 && self.rows_written >= self.max_rows
    }

    /// Flush and hand back the underlying stream
    pub fn finish(mut self) -> Result<W, ConvertError> {
        self.out
            .flush()
            .map_err(|e| ConvertError::io(&self.path, e))?;
        tracing::debug!("Closed output '{}' after {} rows", self.path.display(), self.rows_written);
        Ok(self.out)
    }
}

impl<W: Write> RecordSink for JsonlWriter<W> {
    fn write(&mut self, record: &Record) -> Result<ControlFlow<()>, ConvertError> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out
            .write_all(b"\n")
            .map_err(|e| ConvertError::io(&self.path, e))?;
        self.rows_written += 1;

        if self.cap_reached() {
            Ok(ControlFlow::Break(()))
        } else {
            Ok(ControlFlow::Continue(()))
        }
    }

    fn rows_written(&self) -> usize {
        self.rows_written
    }
}
