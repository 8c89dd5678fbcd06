// ============================================================
// Layer 4: Artifact Loader
// ============================================================
// Reads one artifact file into an `Artifact`: its shape plus
// its values flattened row-major and normalised to f32, so no
// mixed-precision arithmetic can happen downstream.
//
// Supported containers:
//   .npy → ndarray-npy, element types f32 / f64 / i64 / i32
//   .pt  → torch.rs, candle's pickle reader (cargo feature `torch`)
//
// A file that cannot be parsed as numeric data is a FormatError.
// When `.pt` reading was not compiled in, asking for it is an
// EnvironmentError, raised before any file is touched.

use std::path::Path;

use ndarray::ArrayD;
use ndarray_npy::read_npy;

#[cfg(feature = "torch")]
use crate::data::torch::TorchReader;
use crate::domain::{
    artifact::Artifact,
    error::ConvertError,
    options::ArtifactFormat,
    traits::ArtifactReader,
};

/// Pick the reader for `format`, or fail if this build cannot read it.
pub fn reader_for(format: ArtifactFormat) -> Result<Box<dyn ArtifactReader>, ConvertError> {
    match format {
        ArtifactFormat::Npy => Ok(Box::new(NpyReader)),

        #[cfg(feature = "torch")]
        ArtifactFormat::Pt => Ok(Box::new(TorchReader)),

        #[cfg(not(feature = "torch"))]
        ArtifactFormat::Pt => Err(ConvertError::Environment {
            capability: "PyTorch .pt reading",
            hint: "Rebuild with `cargo build --features torch`, \
                   or convert the artifacts to .npy and pass `--format npy`.",
        }),
    }
}

pub(crate) fn format_error(path: &Path, reason: impl Into<String>) -> ConvertError {
    ConvertError::Format {
        path:   path.to_path_buf(),
        reason: reason.into(),
    }
}

// ─── NpyReader ────────────────────────────────────────────────────────────────
pub struct NpyReader;

impl ArtifactReader for NpyReader {
    fn read(&self, path: &Path) -> Result<Artifact, ConvertError> {
        let array = read_npy_as_f32(path)?;
        let shape = array.shape().to_vec();

        // iter() walks logical (row-major) order even for Fortran-ordered files
        let values: Vec<f32> = array.iter().copied().collect();

        tracing::debug!("Read {:?} from '{}'", shape, path.display());
        Ok(Artifact::new(path, shape, values))
    }
}

/// Try the accepted element types in turn, casting to f32.
fn read_npy_as_f32(path: &Path) -> Result<ArrayD<f32>, ConvertError> {
    let first_err = match read_npy::<_, ArrayD<f32>>(path) {
        Ok(array) => return Ok(array),
        Err(e)    => e,
    };

    if let Ok(array) = read_npy::<_, ArrayD<f64>>(path) {
        return Ok(array.mapv(|v| v as f32));
    }
    if let Ok(array) = read_npy::<_, ArrayD<i64>>(path) {
        return Ok(array.mapv(|v| v as f32));
    }
    if let Ok(array) = read_npy::<_, ArrayD<i32>>(path) {
        return Ok(array.mapv(|v| v as f32));
    }

    Err(format_error(path, first_err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array4};
    use ndarray_npy::write_npy;
    use tempfile::TempDir;

    #[test]
    fn test_reads_f32_row_major() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("a.npy");
        let arr  = Array::from_shape_vec((2, 1, 2, 3), (0..12).map(|v| v as f32).collect()).unwrap();
        write_npy(&path, &arr).unwrap();

        let artifact = NpyReader.read(&path).unwrap();
        assert_eq!(artifact.shape, vec![2, 1, 2, 3]);
        assert_eq!(artifact.values, (0..12).map(|v| v as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_f64_is_coerced_to_f32() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("a.npy");
        let arr: Array4<f64> = Array4::from_elem((2, 1, 1, 2), 0.1);
        write_npy(&path, &arr).unwrap();

        let artifact = NpyReader.read(&path).unwrap();
        assert_eq!(artifact.values, vec![0.1f32; 4]);
    }

    #[test]
    fn test_integer_data_is_coerced_to_f32() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("a.npy");
        let arr: Array4<i64> = Array4::from_elem((2, 1, 1, 1), 7);
        write_npy(&path, &arr).unwrap();

        assert_eq!(NpyReader.read(&path).unwrap().values, vec![7.0, 7.0]);
    }

    #[test]
    fn test_garbage_is_format_error() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("a.npy");
        std::fs::write(&path, b"definitely not numpy").unwrap();

        assert!(matches!(NpyReader.read(&path), Err(ConvertError::Format { .. })));
    }

    #[cfg(feature = "torch")]
    #[test]
    fn test_pt_reader_available() {
        assert!(reader_for(ArtifactFormat::Pt).is_ok());
    }


    #[cfg(not(feature = "torch"))]
    #[test]
    fn test_pt_without_feature_is_environment_error() {
        let err = reader_for(ArtifactFormat::Pt).err().unwrap();
        assert!(matches!(err, ConvertError::Environment { .. }));
        assert!(err.to_string().contains("--features torch"));
    }
}
