// ============================================================
// Layer 2: ConvertUseCase
// ============================================================
// One conversion run, strictly sequential:
//
//   Step 1: Check the artifact reader is available  (Layer 4)
//   Step 2: Discover artifacts, sorted by path       (Layer 4)
//   Step 3: Open the output file once                (Layer 6)
//   Step 4: For each artifact:
//             load → validate shape → [label] → reduce + delta
//             → emit one record per row/variant
//   Step 5: Flush and close the output               (Layer 6)
//
// Any error aborts the whole run. Records already written stay
// in the file; nothing is skipped and nothing is retried.
// The row cap is the only early exit that counts as success.

use std::{
    ops::ControlFlow,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{discovery::discover, label::infer_label_from_filename, loader::reader_for};
use crate::domain::{
    error::ConvertError,
    options::{ArtifactFormat, LabelMode, OutputMode, Pooling, Reduction, Split},
    record::{Body, Meta, Record},
    traits::{ArtifactReader, RecordSink},
};
use crate::infra::jsonl::JsonlWriter;
use crate::tensor::{
    assembler::{Assembler, ReducedBatch},
    default_device,
    ConvertBackend,
};

// ─── Conversion Configuration ────────────────────────────────────────────────
// Everything a run needs, independent of how it was supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    pub input_dir:  PathBuf,
    pub output:     PathBuf,
    pub split:      Split,
    /// Signed; -1 = last layer. Ignored under mean pooling.
    pub layer:      i64,
    pub pool:       Pooling,
    pub label_mode: LabelMode,
    pub delta_only: bool,
    /// 0 = no cap
    pub max_rows:   usize,
    /// Free-text provenance copied into every record
    pub model:      String,
    pub format:     ArtifactFormat,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input_dir:  PathBuf::from("activations"),
            output:     PathBuf::from("activations.jsonl"),
            split:      Split::Train,
            layer:      -1,
            pool:       Pooling::Layer,
            label_mode: LabelMode::Filename,
            delta_only: false,
            max_rows:   0,
            model:      String::new(),
            format:     ArtifactFormat::Pt,
        }
    }
}

impl ConvertConfig {
    pub fn reduction(&self) -> Reduction {
        Reduction::new(self.pool, self.layer)
    }

    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from_delta_only(self.delta_only)
    }
}

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub artifacts_seen: usize,
    pub rows_written:   usize,
    /// True when the row cap stopped the run early
    pub truncated:      bool,
}

// ─── ConvertUseCase ───────────────────────────────────────────────────────────
pub struct ConvertUseCase {
    config: ConvertConfig,
}

impl ConvertUseCase {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ConversionSummary> {
        let cfg = &self.config;
        tracing::debug!("Convert config: {}", serde_json::to_string(cfg)?);

        // ── Step 1: reader availability ───────────────────────────────────────
        let reader = reader_for(cfg.format)?;

        // ── Step 2: discovery (before the output exists) ──────────────────────
        let paths = discover(&cfg.input_dir, cfg.format)?;

        // ── Step 3: single output stream for the whole run ────────────────────
        let mut writer = JsonlWriter::create(&cfg.output, cfg.max_rows)
            .with_context(|| format!("Cannot create output '{}'", cfg.output.display()))?;

        // ── Step 4: convert; on error the writer drops and flushes ────────────
        let summary = self.convert_all(reader.as_ref(), &paths, &mut writer)?;

        // ── Step 5: explicit close ────────────────────────────────────────────
        writer.finish()?;

        if summary.truncated {
            tracing::info!("Stopped at max_rows={}", cfg.max_rows);
        }
        tracing::info!(
            "Wrote {} rows from {} artifacts to '{}'",
            summary.rows_written,
            summary.artifacts_seen,
            cfg.output.display()
        );
        Ok(summary)
    }

    /// Convert `paths` in order into `sink`, stopping when the sink is full.
    pub fn convert_all<S: RecordSink>(
        &self,
        reader: &dyn ArtifactReader,
        paths:  &[PathBuf],
        sink:   &mut S,
    ) -> Result<ConversionSummary> {
        let cfg       = &self.config;
        let reduction = cfg.reduction();
        let assembler = Assembler::<ConvertBackend>::new(reduction, default_device());
        let layer     = reduction.descriptor();

        let mut summary = ConversionSummary::default();

        for path in paths {
            summary.artifacts_seen += 1;

            let flow = self
                .convert_one(reader, &assembler, &layer, path, sink)
                .with_context(|| format!("Failed to convert '{}'", path.display()))?;

            if flow.is_break() {
                summary.truncated = true;
                break;
            }
        }

        summary.rows_written = sink.rows_written();
        Ok(summary)
    }

    fn convert_one<S: RecordSink>(
        &self,
        reader:    &dyn ArtifactReader,
        assembler: &Assembler<ConvertBackend>,
        layer:     &str,
        path:      &Path,
        sink:      &mut S,
    ) -> Result<ControlFlow<()>, ConvertError> {
        let cfg      = &self.config;
        let artifact = reader.read(path)?;
        let dims     = artifact.validate(cfg.split)?;
        let src      = artifact.file_name();

        tracing::info!(
            "{}: shape {:?} (B={}, L={}, D={})",
            src, artifact.shape, dims.batch, dims.layers, dims.dim
        );

        let batch = if cfg.split.is_train() {
            assembler.train(&artifact, dims)?
        } else {
            let y = match cfg.label_mode {
                LabelMode::Filename => infer_label_from_filename(&src, cfg.format)?,
            };
            assembler.eval(&artifact, dims, cfg.split, y)?
        };

        emit_batch(&batch, &src, layer, cfg, sink)
    }
}

/// Write every row of `batch`, variants in order within each row.
/// Returns `Break` as soon as the sink reports it is full.
fn emit_batch<S: RecordSink>(
    batch: &ReducedBatch,
    src:   &str,
    layer: &str,
    cfg:   &ConvertConfig,
    sink:  &mut S,
) -> Result<ControlFlow<()>, ConvertError> {
    let dims = batch.dims;

    for i in 0..dims.batch {
        for outcome in &batch.outcomes {
            let body = match cfg.output_mode() {
                OutputMode::DeltaOnly => Body::Delta {
                    delta: batch.row(&outcome.delta, i).to_vec(),
                },
                OutputMode::BeforeAfter => Body::BeforeAfter {
                    before: batch.row(&batch.before, i).to_vec(),
                    after:  batch.row(&outcome.after, i).to_vec(),
                },
            };

            let record = Record {
                body,
                y: outcome.y,
                meta: Meta {
                    src:         src.to_string(),
                    split:       cfg.split,
                    variant:     outcome.variant,
                    layer:       layer.to_string(),
                    model:       cfg.model.clone(),
                    example_idx: i,
                    batch_size:  dims.batch,
                    layers:      dims.layers,
                    dim:         dims.dim,
                },
            };

            if sink.write(&record)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
    }

    Ok(ControlFlow::Continue(()))
}
