// ============================================================
// Layer 3: Conversion Errors
// ============================================================
// Every failure is fatal for the whole run. There is no
// skip-and-continue path anywhere in the converter: one bad
// artifact invalidates the output, so downstream training
// splits are either complete or absent.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::options::Split;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// A capability the run needs was not compiled into this binary.
    #[error("{capability} is unavailable in this build. {hint}")]
    Environment {
        capability: &'static str,
        hint:       &'static str,
    },

    #[error("No .{extension} files found in {}", dir.display())]
    Discovery { dir: PathBuf, extension: &'static str },

    #[error("Cannot read '{}' as numeric data: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("Expected {split}[0]={expected}, got {actual:?}")]
    Shape {
        split:    Split,
        expected: usize,
        actual:   Vec<usize>,
    },

    #[error("Unexpected filename for label inference: {file}. Expected {clean} or {poisoned}")]
    Label {
        file:     String,
        clean:    String,
        poisoned: String,
    },

    #[error("Layer index {index} is out of range for {layers} layers")]
    Index { index: i64, layers: usize },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot serialise record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
