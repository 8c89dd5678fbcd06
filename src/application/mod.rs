// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Orchestrates the other layers for one run. No tensor math
// (Layer 5), no argument parsing or printing (Layer 1), no
// direct file parsing (Layer 4) happens here; this layer only
// decides what runs in which order and when to stop.

// The convert workflow: artifacts in, JSONL out
pub mod convert_use_case;

// Dry run: load and validate every artifact, write nothing
pub mod inspect_use_case;
