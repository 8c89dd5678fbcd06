// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust types and traits describing what the converter
// works with: artifacts, run options, output records and the
// error taxonomy every other layer reports through.
//
// Rules for this layer:
//   - NO burn tensor types here (those live in Layer 5)
//   - NO clap types here (those live in Layer 1)
//   - NO file I/O
//
// Everything in here is cheap to construct in a unit test.

// A loaded activation artifact and its [B, L, D] dimensions
pub mod artifact;

// Split, pooling, output mode and container selectors
pub mod options;

// One JSONL output line and its metadata
pub mod record;

// Typed error taxonomy (environment, discovery, format, shape, label, index)
pub mod error;

// Abstractions the data and infra layers implement
pub mod traits;
