// ============================================================
// Layer 5: Reducer
// ============================================================
// Collapses the layer axis of a [B, L, D] slice:
//
//   layer mode: keep one layer → t[:, layer, :]
//   mean mode:  average all layers → t.mean(dim=1)
//
// The layer index is resolved (negative = from the end) and
// bounds-checked before any tensor op runs.

use burn::prelude::*;

use crate::domain::{error::ConvertError, options::Reduction};

/// [B, L, D] → [B, D] at a resolved layer index
pub fn select_layer<B: Backend>(slice: Tensor<B, 3>, layer: usize) -> Tensor<B, 2> {
    let [batch, _, dim] = slice.dims();
    slice
        .slice([0..batch, layer..layer + 1, 0..dim])
        .reshape([batch, dim])
}

/// [B, L, D] → [B, D], arithmetic mean over L
pub fn mean_pool_layers<B: Backend>(slice: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, _, dim] = slice.dims();
    // mean_dim keeps the reduced axis as size 1
    slice.mean_dim(1).reshape([batch, dim])
}

pub fn reduce<B: Backend>(
    slice:     Tensor<B, 3>,
    reduction: &Reduction,
) -> Result<Tensor<B, 2>, ConvertError> {
    let [_, layers, _] = slice.dims();

    match reduction.resolve(layers)? {
        Some(layer) => Ok(select_layer(slice, layer)),
        None        => Ok(mean_pool_layers(slice)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{default_device, ConvertBackend};

    type TB = ConvertBackend;

    /// [B=2, L=3, D=2] where value = 100*b + 10*l + d
    fn sample() -> Tensor<TB, 3> {
        let mut values = Vec::new();
        for b in 0..2 {
            for l in 0..3 {
                for d in 0..2 {
                    values.push((100 * b + 10 * l + d) as f32);
                }
            }
        }
        Tensor::from_data(TensorData::new(values, [2, 3, 2]), &default_device())
    }

    fn to_vec(t: Tensor<TB, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_select_layer_picks_row_per_example() {
        let out = reduce(sample(), &Reduction::Layer { index: 1 }).unwrap();
        assert_eq!(out.dims(), [2, 2]);
        assert_eq!(to_vec(out), vec![10.0, 11.0, 110.0, 111.0]);
    }

    #[test]
    fn test_negative_one_equals_last_layer() {
        let last = to_vec(reduce(sample(), &Reduction::Layer { index: -1 }).unwrap());
        let idx  = to_vec(reduce(sample(), &Reduction::Layer { index: 2 }).unwrap());
        assert_eq!(last, idx);
        assert_eq!(last, vec![20.0, 21.0, 120.0, 121.0]);
    }

    #[test]
    fn test_mean_pool_shape_independent_of_layers() {
        let out = reduce(sample(), &Reduction::Mean).unwrap();
        assert_eq!(out.dims(), [2, 2]);
        // mean over l of 10*l is 10
        assert_eq!(to_vec(out), vec![10.0, 11.0, 110.0, 111.0]);
    }

    #[test]
    fn test_out_of_range_layer_is_index_error() {
        let err = reduce(sample(), &Reduction::Layer { index: 3 }).unwrap_err();
        assert!(matches!(err, ConvertError::Index { index: 3, layers: 3 }));

        let err = reduce(sample(), &Reduction::Layer { index: -4 }).unwrap_err();
        assert!(matches!(err, ConvertError::Index { index: -4, layers: 3 }));
    }
}
