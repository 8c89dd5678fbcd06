// ============================================================
// Layer 3: Artifact Domain Type
// ============================================================
// One input file after loading: its path, its on-disk shape
// and its values flattened in row-major order, already
// normalised to f32 by the loader.
//
// Logical shapes:
//   train    → [3, B, L, D]
//   val/test → [2, B, L, D]
// where B = batch size, L = layers, D = feature dimension.

use std::path::{Path, PathBuf};

use crate::domain::{error::ConvertError, options::Split};

/// The [B, L, D] dimensions shared by every slice of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub batch:  usize,
    pub layers: usize,
    pub dim:    usize,
}

#[derive(Debug, Clone)]
pub struct Artifact {
    pub path:   PathBuf,
    pub shape:  Vec<usize>,
    pub values: Vec<f32>,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, shape: Vec<usize>, values: Vec<f32>) -> Self {
        Self { path: path.into(), shape, values }
    }

    /// Base filename, as written to `meta.src` and used for label inference
    pub fn file_name(&self) -> String {
        base_name(&self.path)
    }

    /// Check the axis-0 convention for `split` and return [B, L, D].
    ///
    /// Anything that is not rank 4 with the split's leading
    /// cardinality is rejected with the actual shape attached.
    pub fn validate(&self, split: Split) -> Result<Dims, ConvertError> {
        let expected = split.expected_slices();

        match self.shape.as_slice() {
            [n, batch, layers, dim] if *n == expected => Ok(Dims {
                batch:  *batch,
                layers: *layers,
                dim:    *dim,
            }),
            _ => Err(ConvertError::Shape {
                split,
                expected,
                actual: self.shape.clone(),
            }),
        }
    }
}

pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(shape: Vec<usize>) -> Artifact {
        let n = shape.iter().product();
        Artifact::new("/tmp/run/activations_0.pt", shape, vec![0.0; n])
    }

    #[test]
    fn test_train_shape_accepted() {
        let dims = artifact(vec![3, 2, 4, 3]).validate(Split::Train).unwrap();
        assert_eq!(dims, Dims { batch: 2, layers: 4, dim: 3 });
    }

    #[test]
    fn test_eval_shape_under_train_rejected() {
        let err = artifact(vec![2, 2, 4, 3]).validate(Split::Train).unwrap_err();
        match err {
            ConvertError::Shape { expected, actual, .. } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, vec![2, 2, 4, 3]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_train_shape_under_test_rejected() {
        assert!(artifact(vec![3, 1, 1, 1]).validate(Split::Test).is_err());
    }

    #[test]
    fn test_wrong_rank_rejected() {
        assert!(artifact(vec![2, 4, 3]).validate(Split::Val).is_err());
    }

    #[test]
    fn test_file_name_is_base_name() {
        assert_eq!(artifact(vec![2, 1, 1, 1]).file_name(), "activations_0.pt");
    }
}
