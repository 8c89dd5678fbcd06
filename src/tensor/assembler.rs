// ============================================================
// Layer 5: Delta Assembler
// ============================================================
// Turns one validated artifact into per-row vectors ready to
// be written as records.
//
// Train  [3, B, L, D] = (primary, clean, poisoned):
//   clean_delta    = clean_v    − primary_v      → y = 0
//   poisoned_delta = poisoned_v − primary_v      → y = 1
//   after          = primary_v + delta
//
// Val/test [2, B, L, D] = (primary, full):
//   delta = full_v − primary_v                   → y from filename
//   after = full_v
//
// The two "after" paths differ on purpose: training rebuilds
// "after" from the delta, evaluation uses the reduced vector
// itself. Under f32 rounding the two are not always equal,
// and downstream datasets depend on which one was written.

use burn::prelude::*;

use crate::domain::{
    artifact::{Artifact, Dims},
    error::ConvertError,
    options::{Reduction, Split},
    record::Variant,
};
use crate::tensor::reducer::reduce;

// ─── Output types ─────────────────────────────────────────────────────────────
/// One labelled outcome per row: both training variants, or the
/// single val/test comparison. All vectors are [B * D] row-major.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub variant: Option<Variant>,
    pub y:       u8,
    pub delta:   Vec<f32>,
    pub after:   Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ReducedBatch {
    pub dims:     Dims,
    /// Reduced primary slice, [B * D]
    pub before:   Vec<f32>,
    /// Emitted in this order for every row
    pub outcomes: Vec<Outcome>,
}

impl ReducedBatch {
    /// The D values of row `i` in a [B * D] vector
    pub fn row<'a>(&self, values: &'a [f32], i: usize) -> &'a [f32] {
        let d = self.dims.dim;
        &values[i * d..(i + 1) * d]
    }
}

// ─── Assembler ────────────────────────────────────────────────────────────────
pub struct Assembler<B: Backend> {
    reduction: Reduction,
    device:    B::Device,
}

impl<B: Backend> Assembler<B> {
    pub fn new(reduction: Reduction, device: B::Device) -> Self {
        Self { reduction, device }
    }

    /// Train branch: slices are (primary, clean, poisoned).
    pub fn train(&self, artifact: &Artifact, dims: Dims) -> Result<ReducedBatch, ConvertError> {
        if let Some(batch) = self.degenerate(dims, &[Some(Variant::Clean), Some(Variant::Poisoned)], &[0, 1])? {
            return Ok(batch);
        }

        let [primary_v, clean_v, poisoned_v] = self.reduced_slices(artifact, dims, Split::Train)?;

        let clean_delta    = clean_v.sub(primary_v.clone());
        let poisoned_delta = poisoned_v.sub(primary_v.clone());

        // Rebuild "after" through the delta rather than reusing clean_v / poisoned_v
        let clean_after    = primary_v.clone().add(clean_delta.clone());
        let poisoned_after = primary_v.clone().add(poisoned_delta.clone());

        Ok(ReducedBatch {
            dims,
            before: into_values(artifact, primary_v)?,
            outcomes: vec![
                Outcome {
                    variant: Some(Variant::Clean),
                    y:       Variant::Clean.label(),
                    delta:   into_values(artifact, clean_delta)?,
                    after:   into_values(artifact, clean_after)?,
                },
                Outcome {
                    variant: Some(Variant::Poisoned),
                    y:       Variant::Poisoned.label(),
                    delta:   into_values(artifact, poisoned_delta)?,
                    after:   into_values(artifact, poisoned_after)?,
                },
            ],
        })
    }

    /// Val/test branch: slices are (primary, full); `y` applies to every row.
    pub fn eval(&self, artifact: &Artifact, dims: Dims, split: Split, y: u8) -> Result<ReducedBatch, ConvertError> {
        if let Some(batch) = self.degenerate(dims, &[None], &[y])? {
            return Ok(batch);
        }

        let [primary_v, full_v] = self.reduced_slices(artifact, dims, split)?;

        let delta = full_v.clone().sub(primary_v.clone());

        Ok(ReducedBatch {
            dims,
            before: into_values(artifact, primary_v)?,
            outcomes: vec![Outcome {
                variant: None,
                y,
                delta: into_values(artifact, delta)?,
                after: into_values(artifact, full_v)?,
            }],
        })
    }

    /// Split axis 0 into [B, L, D] slices and reduce each one.
    /// Axis 0 must hold exactly `N` slices.
    fn reduced_slices<const N: usize>(
        &self,
        artifact: &Artifact,
        dims:     Dims,
        split:    Split,
    ) -> Result<[Tensor<B, 2>; N], ConvertError> {
        let Dims { batch, layers, dim } = dims;
        let n = artifact.shape.first().copied().unwrap_or(0);

        let data = TensorData::new(artifact.values.clone(), artifact.shape.clone());
        let stacked: Tensor<B, 4> = Tensor::from_data(data, &self.device);

        (0..n)
            .map(|k| {
                let slice = stacked
                    .clone()
                    .slice([k..k + 1, 0..batch, 0..layers, 0..dim])
                    .reshape([batch, layers, dim]);
                reduce(slice, &self.reduction)
            })
            .collect::<Result<Vec<_>, _>>()?
            .try_into()
            .map_err(|_| ConvertError::Shape {
                split,
                expected: N,
                actual:   artifact.shape.clone(),
            })
    }

    /// Zero-sized axes never reach burn. The layer index is still
    /// checked; mean pooling over zero layers yields NaN like an
    /// empty mean does.
    fn degenerate(
        &self,
        dims:     Dims,
        variants: &[Option<Variant>],
        labels:   &[u8],
    ) -> Result<Option<ReducedBatch>, ConvertError> {
        self.reduction.resolve(dims.layers)?;

        if dims.batch > 0 && dims.layers > 0 && dims.dim > 0 {
            return Ok(None);
        }

        let nan = vec![f32::NAN; dims.batch * dims.dim];
        let outcomes = variants
            .iter()
            .zip(labels)
            .map(|(&variant, &y)| Outcome {
                variant,
                y,
                delta: nan.clone(),
                after: nan.clone(),
            })
            .collect();

        Ok(Some(ReducedBatch { dims, before: nan, outcomes }))
    }
}

fn into_values<B: Backend>(artifact: &Artifact, t: Tensor<B, 2>) -> Result<Vec<f32>, ConvertError> {
    t.into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| ConvertError::Format {
            path:   artifact.path.clone(),
            reason: format!("cannot read reduced tensor back as f32: {e:?}"),
        })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{default_device, ConvertBackend};

    fn assembler(reduction: Reduction) -> Assembler<ConvertBackend> {
        Assembler::new(reduction, default_device())
    }

    /// Slice k holds value (k + 1) * (1 + l) + 0.1 * d at [b, l, d] plus b
    fn artifact(n: usize, batch: usize, layers: usize, dim: usize) -> Artifact {
        let mut values = Vec::new();
        for k in 0..n {
            for b in 0..batch {
                for l in 0..layers {
                    for d in 0..dim {
                        values.push((k + 1) as f32 * (1 + l) as f32 + 0.1 * d as f32 + b as f32);
                    }
                }
            }
        }
        Artifact::new("activations_1.npy", vec![n, batch, layers, dim], values)
    }

    #[test]
    fn test_train_emits_clean_then_poisoned() {
        let a    = artifact(3, 2, 4, 3);
        let dims = a.validate(Split::Train).unwrap();
        let out  = assembler(Reduction::Layer { index: -1 }).train(&a, dims).unwrap();

        assert_eq!(out.outcomes.len(), 2);
        assert_eq!(out.outcomes[0].variant, Some(Variant::Clean));
        assert_eq!(out.outcomes[0].y, 0);
        assert_eq!(out.outcomes[1].variant, Some(Variant::Poisoned));
        assert_eq!(out.outcomes[1].y, 1);
        assert_eq!(out.before.len(), 2 * 3);
    }

    #[test]
    fn test_train_deltas_against_primary() {
        let a    = artifact(3, 1, 4, 2);
        let dims = a.validate(Split::Train).unwrap();
        let out  = assembler(Reduction::Layer { index: 0 }).train(&a, dims).unwrap();

        // layer 0: primary = 1 + 0.1d, clean = 2 + 0.1d, poisoned = 3 + 0.1d
        for (delta, expected) in out.outcomes[0].delta.iter().zip([1.0f32, 1.0]) {
            assert!((delta - expected).abs() < 1e-6);
        }
        for (delta, expected) in out.outcomes[1].delta.iter().zip([2.0f32, 2.0]) {
            assert!((delta - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_train_after_is_before_plus_delta() {
        let a    = artifact(3, 2, 3, 4);
        let dims = a.validate(Split::Train).unwrap();
        let out  = assembler(Reduction::Mean).train(&a, dims).unwrap();

        for outcome in &out.outcomes {
            let rebuilt: Vec<f32> = out.before.iter().zip(&outcome.delta).map(|(b, d)| b + d).collect();
            assert_eq!(rebuilt, outcome.after);
        }
    }

    #[test]
    fn test_eval_after_is_full_reduced_vector() {
        let a    = artifact(2, 2, 3, 2);
        let dims = a.validate(Split::Val).unwrap();
        let out  = assembler(Reduction::Layer { index: 1 }).eval(&a, dims, Split::Val, 1).unwrap();

        assert_eq!(out.outcomes.len(), 1);
        let outcome = &out.outcomes[0];
        assert_eq!(outcome.variant, None);
        assert_eq!(outcome.y, 1);

        // full slice (k = 1), layer 1: 2 * 2 + 0.1d + b
        let expected: Vec<f32> = [(0, 0), (0, 1), (1, 0), (1, 1)]
            .iter()
            .map(|&(b, d)| 2.0 * 2.0 + 0.1 * d as f32 + b as f32)
            .collect();
        assert_eq!(outcome.after, expected);
        assert_eq!(out.row(&outcome.after, 1), &expected[2..4]);
    }

    #[test]
    fn test_mean_pool_output_has_dim_entries_per_row() {
        for layers in [1, 2, 7] {
            let a    = artifact(2, 3, layers, 5);
            let dims = a.validate(Split::Test).unwrap();
            let out  = assembler(Reduction::Mean).eval(&a, dims, Split::Test, 0).unwrap();
            assert_eq!(out.before.len(), 3 * 5);
            assert_eq!(out.row(&out.outcomes[0].delta, 2).len(), 5);
        }
    }

    #[test]
    fn test_index_error_propagates() {
        let a    = artifact(2, 1, 2, 2);
        let dims = a.validate(Split::Test).unwrap();
        let err  = assembler(Reduction::Layer { index: 2 }).eval(&a, dims, Split::Test, 0).unwrap_err();
        assert!(matches!(err, ConvertError::Index { index: 2, layers: 2 }));
    }

    #[test]
    fn test_empty_batch_yields_no_rows() {
        let a    = Artifact::new("x.npy", vec![3, 0, 4, 3], Vec::new());
        let dims = a.validate(Split::Train).unwrap();
        let out  = assembler(Reduction::Layer { index: -1 }).train(&a, dims).unwrap();
        assert!(out.before.is_empty());
        assert_eq!(out.outcomes.len(), 2);
    }

    #[test]
    fn test_slice_count_mismatch_is_shape_error() {
        // eval-shaped artifact handed to the train branch
        let a    = artifact(2, 2, 3, 2);
        let dims = a.validate(Split::Val).unwrap();
        let err  = assembler(Reduction::Mean).train(&a, dims).unwrap_err();

        assert!(matches!(
            err,
            ConvertError::Shape { split: Split::Train, expected: 3, ref actual } if actual == &vec![2, 2, 3, 2]
        ));
    }
}
