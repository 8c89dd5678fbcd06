// ============================================================
// Layer 2: InspectUseCase
// ============================================================
// A dry run of `convert`: discovers and loads every artifact,
// checks its shape for the split, checks the layer index fits,
// and resolves the filename label for val/test. Nothing is
// written. It stops on the first failure with the same error
// `convert` would raise, so a clean inspect means a clean
// conversion.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{discovery::discover, label::infer_label_from_filename, loader::reader_for};
use crate::domain::{
    artifact::Dims,
    options::{ArtifactFormat, Pooling, Reduction, Split},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectConfig {
    pub input_dir: PathBuf,
    pub split:     Split,
    pub layer:     i64,
    pub pool:      Pooling,
    pub format:    ArtifactFormat,
}

/// One validated artifact
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactReport {
    pub file:  String,
    pub dims:  Dims,
    /// Filename label; None for train artifacts
    pub label: Option<u8>,
    /// Rows `convert` would emit for this file
    pub rows:  usize,
}

pub struct InspectUseCase {
    config: InspectConfig,
}

impl InspectUseCase {
    pub fn new(config: InspectConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<ArtifactReport>> {
        let cfg       = &self.config;
        let reader    = reader_for(cfg.format)?;
        let reduction = Reduction::new(cfg.pool, cfg.layer);

        let mut reports = Vec::new();
        for path in discover(&cfg.input_dir, cfg.format)? {
            let artifact = reader
                .read(&path)
                .with_context(|| format!("Failed to inspect '{}'", path.display()))?;
            let file = artifact.file_name();

            let dims = artifact
                .validate(cfg.split)
                .with_context(|| format!("Failed to inspect '{file}'"))?;
            reduction
                .resolve(dims.layers)
                .with_context(|| format!("Failed to inspect '{file}'"))?;

            let (label, rows) = if cfg.split.is_train() {
                (None, 2 * dims.batch)
            } else {
                let y = infer_label_from_filename(&file, cfg.format)
                    .with_context(|| format!("Failed to inspect '{file}'"))?;
                (Some(y), dims.batch)
            };

            tracing::debug!("{file}: {:?} ok", artifact.shape);
            reports.push(ArtifactReport { file, dims, label, rows });
        }

        Ok(reports)
    }
}
