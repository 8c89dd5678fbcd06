// ============================================================
// Layer 4: Data Access
// ============================================================
// Everything that touches input files:
//
//   input dir
//       │
//       ▼
//   discovery   → sorted list of *.pt / *.npy paths
//       │
//       ▼
//   loader      → Artifact { shape, f32 values }
//       │
//       ▼
//   label       → y for val/test files, from the filename
//
// Each step is a separate module with its own tests.

/// Lists artifact files in deterministic order
pub mod discovery;

/// Reads .npy / .pt containers into f32 artifacts
pub mod loader;

/// PyTorch archives: mappings, bare tensors and nested lists
#[cfg(feature = "torch")]
pub mod torch;

/// Strict filename → label policy for evaluation splits
pub mod label;
