// ============================================================
// Layer 4: PyTorch Archive Reader
// ============================================================
// A `torch.save` file is a zip archive holding a pickled object
// graph (`<prefix>/data.pkl`) plus one raw storage blob per
// tensor (`<prefix>/data/<key>`).
//
// Accepted root objects:
//   mapping with one tensor → candle's `read_all`
//   bare tensor             → unpickle the root, load its storage
//   nested numeric lists    → `[[...], ...]`, rectangular only
//
// Anything else (several tensors, non-numeric payloads, truncated
// archives) is a FormatError naming the file.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use candle_core::{
    pickle::{self, Object, Stack, TensorInfo},
    DType, Device, Tensor,
};

use crate::data::loader::format_error;
use crate::domain::{artifact::Artifact, error::ConvertError, traits::ArtifactReader};

pub struct TorchReader;

impl ArtifactReader for TorchReader {
    fn read(&self, path: &Path) -> Result<Artifact, ConvertError> {
        let mut tensors = pickle::read_all(path)
            .map_err(|e| format_error(path, e.to_string()))?;

        let (shape, values) = match tensors.len() {
            0 => read_root_object(path)?,
            1 => {
                let (name, tensor) = tensors.remove(0);
                tracing::debug!("Using tensor '{}' from '{}'", name, path.display());
                tensor_to_f32(path, &tensor)?
            }
            n => {
                let names: Vec<String> = tensors.into_iter().map(|(name, _)| name).collect();
                return Err(format_error(
                    path,
                    format!("expected a single tensor, found {n}: {names:?}"),
                ));
            }
        };

        tracing::debug!("Read {:?} from '{}'", shape, path.display());
        Ok(Artifact::new(path, shape, values))
    }
}

fn tensor_to_f32(path: &Path, tensor: &Tensor) -> Result<(Vec<usize>, Vec<f32>), ConvertError> {
    let shape  = tensor.dims().to_vec();
    let values = tensor
        .to_dtype(DType::F32)
        .and_then(|t| t.flatten_all())
        .and_then(|t| t.to_vec1::<f32>())
        .map_err(|e| format_error(path, e.to_string()))?;
    Ok((shape, values))
}

// ─── Bare root object ─────────────────────────────────────────────────────────

/// Unpickle `data.pkl` ourselves when the root is not a mapping.
fn read_root_object(path: &Path) -> Result<(Vec<usize>, Vec<f32>), ConvertError> {
    let file    = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| format_error(path, e.to_string()))?;

    let pkl_name = zip
        .file_names()
        .find(|name| name.ends_with("data.pkl"))
        .map(str::to_owned)
        .ok_or_else(|| format_error(path, "no data.pkl in archive"))?;
    let dir_name = PathBuf::from(pkl_name.trim_end_matches(".pkl"));

    let root = {
        let entry = zip
            .by_name(&pkl_name)
            .map_err(|e| format_error(path, e.to_string()))?;
        let mut stack = Stack::empty();
        stack
            .read_loop(&mut BufReader::new(entry))
            .map_err(|e| format_error(path, e.to_string()))?;
        stack.finalize().map_err(|e| format_error(path, e.to_string()))?
    };

    let info = root
        .clone()
        .into_tensor_info(Object::Unicode("root".to_owned()), &dir_name)
        .map_err(|e| format_error(path, e.to_string()))?;

    match info {
        Some(info) => read_storage(path, &mut zip, &info),
        None       => nested_numbers(path, &root),
    }
}

/// Load a tensor's storage blob and gather it through its layout.
fn read_storage<R: Read + std::io::Seek>(
    path: &Path,
    zip:  &mut zip::ZipArchive<R>,
    info: &TensorInfo,
) -> Result<(Vec<usize>, Vec<f32>), ConvertError> {
    let mut bytes = Vec::new();
    zip.by_name(&info.path)
        .map_err(|e| format_error(path, format!("{}: {e}", info.path)))?
        .read_to_end(&mut bytes)
        .map_err(|e| ConvertError::io(path, e))?;

    let elem  = info.dtype.size_in_bytes();
    let start = info.layout.start_offset().min(bytes.len());
    let data  = &bytes[start..];
    let count = data.len() / elem;

    let storage = Tensor::from_raw_buffer(&data[..count * elem], info.dtype, &[count], &Device::Cpu)
        .and_then(|t| t.to_dtype(DType::F32))
        .and_then(|t| t.to_vec1::<f32>())
        .map_err(|e| format_error(path, e.to_string()))?;

    let shape  = info.layout.dims().to_vec();
    let values = gather_strided(&storage, &shape, info.layout.stride())
        .ok_or_else(|| format_error(path, format!("storage too small for shape {shape:?}")))?;
    Ok((shape, values))
}

/// Walk `shape` in row-major order, reading `storage` through `strides`.
fn gather_strided(storage: &[f32], shape: &[usize], strides: &[usize]) -> Option<Vec<f32>> {
    let total: usize = shape.iter().product();
    let mut values = Vec::with_capacity(total);
    let mut index  = vec![0usize; shape.len()];

    for _ in 0..total {
        let offset: usize = index.iter().zip(strides).map(|(i, s)| i * s).sum();
        values.push(*storage.get(offset)?);

        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    Some(values)
}

// ─── Nested lists ─────────────────────────────────────────────────────────────

fn nested_numbers(path: &Path, root: &Object) -> Result<(Vec<usize>, Vec<f32>), ConvertError> {
    let mut shape  = Vec::new();
    let mut values = Vec::new();
    let mut leaf_depth = None;

    collect_numbers(root, 0, &mut shape, &mut values, &mut leaf_depth)
        .map_err(|reason| format_error(path, reason))?;

    if shape.iter().product::<usize>() != values.len() {
        return Err(format_error(path, "ragged nested list"));
    }
    Ok((shape, values))
}

fn collect_numbers(
    obj:        &Object,
    depth:      usize,
    shape:      &mut Vec<usize>,
    values:     &mut Vec<f32>,
    leaf_depth: &mut Option<usize>,
) -> Result<(), String> {
    let leaf = match obj {
        Object::Float(v) => Some(*v as f32),
        Object::Int(v)   => Some(*v as f32),
        Object::Bool(v)  => Some(if *v { 1.0 } else { 0.0 }),
        _                => None,
    };

    if let Some(v) = leaf {
        if *leaf_depth.get_or_insert(depth) != depth {
            return Err("ragged nested list".to_owned());
        }
        values.push(v);
        return Ok(());
    }

    let items = match obj {
        Object::List(items) | Object::Tuple(items) => items,
        other => return Err(format!("unsupported pickled object: {other:?}")),
    };

    match shape.get(depth) {
        Some(&len) if len != items.len() => return Err("ragged nested list".to_owned()),
        Some(_) => {}
        None    => shape.push(items.len()),
    }

    for item in items {
        collect_numbers(item, depth + 1, shape, values, leaf_depth)?;
    }
    Ok(())
}

// ─── Test fixtures ────────────────────────────────────────────────────────────
