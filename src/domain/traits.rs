// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The two seams of the converter:
//   - ArtifactReader: turns a file into an Artifact
//   - RecordSink:     accepts records one at a time
//
// The application layer only talks to these traits, so tests
// can feed it in-memory sinks and any container format can be
// plugged in behind the reader.

use std::{ops::ControlFlow, path::Path};

use crate::domain::{artifact::Artifact, error::ConvertError, record::Record};

// ─── ArtifactReader ───────────────────────────────────────────────────────────
/// Anything that can load one artifact file into f32 values.
///
/// Implementations:
///   - NpyReader   → NumPy .npy arrays
///   - TorchReader → PyTorch .pt archives (feature `torch`)
pub trait ArtifactReader {
    fn read(&self, path: &Path) -> Result<Artifact, ConvertError>;
}

// ─── RecordSink ───────────────────────────────────────────────────────────────
/// Destination for output records.
///
/// `write` returns `ControlFlow::Break` once the sink will not
/// accept any further records (the row cap was reached); the
/// caller must stop immediately.
pub trait RecordSink {
    fn write(&mut self, record: &Record) -> Result<ControlFlow<()>, ConvertError>;

    /// Records accepted so far
    fn rows_written(&self) -> usize;
}
