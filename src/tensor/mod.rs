// ============================================================
// Layer 5: Tensor Layer (burn)
// ============================================================
// All burn-specific code lives here; no other layer imports
// burn. Artifacts arrive as plain f32 vectors and leave as
// plain f32 vectors, so the rest of the converter never sees
// a backend type.
//
//   reducer.rs   - [B, L, D] → [B, D] by layer selection
//                  or mean pooling
//   assembler.rs - splits an artifact into its slices,
//                  reduces them and computes the deltas for
//                  the train and val/test conventions
//
// Runs on burn's NdArray (CPU) backend: the work is small,
// single-pass and strictly sequential.

pub mod reducer;
pub mod assembler;

/// Backend used by the converter
pub type ConvertBackend = burn::backend::NdArray;

pub fn default_device() -> burn::backend::ndarray::NdArrayDevice {
    burn::backend::ndarray::NdArrayDevice::default()
}
