// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Output-side concerns:
//
//   jsonl.rs - JsonlWriter, the single output stream of a run.
//              Writes one JSON object per line, counts rows,
//              and signals the caller to stop once the
//              configured row cap is reached.

/// Line-delimited JSON sink with a row cap
pub mod jsonl;
