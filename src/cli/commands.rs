// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Two subcommands: `convert` and `inspect`.
//
// Option names are kebab-case; the snake_case spellings used
// by older conversion scripts (--input_dir, --delta_only, ...)
// are accepted as aliases so existing invocations keep working.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::{convert_use_case::ConvertConfig, inspect_use_case::InspectConfig};
use crate::domain::options::{ArtifactFormat, LabelMode, Pooling, Split};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert activation artifacts into JSONL records
    Convert(ConvertArgs),

    /// Load and validate artifacts without writing anything
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Directory containing the artifact files
    #[arg(long, alias = "input_dir")]
    pub input_dir: PathBuf,

    /// Output .jsonl path (overwritten)
    #[arg(long)]
    pub output: PathBuf,

    /// Dataset split: train, val or test
    #[arg(long)]
    pub split: Split,

    /// Layer index, negative counts from the end (-1 = last)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub layer: i64,

    /// Layer reduction: layer or mean
    #[arg(long, default_value = "layer")]
    pub pool: Pooling,

    /// Evaluation label source (only `filename` is supported)
    #[arg(long, alias = "label_mode", default_value = "filename")]
    pub label_mode: LabelMode,

    /// Emit {delta} instead of {before, after}
    #[arg(long, alias = "delta_only")]
    pub delta_only: bool,

    /// Stop after this many records (0 = no cap)
    #[arg(long, alias = "max_rows", default_value_t = 0)]
    pub max_rows: usize,

    /// Provenance string copied into meta.model
    #[arg(long, default_value = "")]
    pub model: String,

    /// Artifact container: pt or npy
    #[arg(long, default_value = "pt")]
    pub format: ArtifactFormat,
}

impl From<ConvertArgs> for ConvertConfig {
    fn from(a: ConvertArgs) -> Self {
        ConvertConfig {
            input_dir:  a.input_dir,
            output:     a.output,
            split:      a.split,
            layer:      a.layer,
            pool:       a.pool,
            label_mode: a.label_mode,
            delta_only: a.delta_only,
            max_rows:   a.max_rows,
            model:      a.model,
            format:     a.format,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(long, alias = "input_dir")]
    pub input_dir: PathBuf,

    #[arg(long)]
    pub split: Split,

    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub layer: i64,

    #[arg(long, default_value = "layer")]
    pub pool: Pooling,

    #[arg(long, default_value = "pt")]
    pub format: ArtifactFormat,
}

impl From<InspectArgs> for InspectConfig {
    fn from(a: InspectArgs) -> Self {
        InspectConfig {
            input_dir: a.input_dir,
            split:     a.split,
            layer:     a.layer,
            pool:      a.pool,
            format:    a.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> ConvertConfig {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Convert(a) => a.into(),
            other => panic!("expected convert, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&["tasktracker-jsonl", "convert", "--input-dir", "in", "--output", "o.jsonl", "--split", "test"]);
        assert_eq!(cfg.split, Split::Test);
        assert_eq!(cfg.layer, -1);
        assert_eq!(cfg.pool, Pooling::Layer);
        assert_eq!(cfg.max_rows, 0);
        assert_eq!(cfg.format, ArtifactFormat::Pt);
        assert!(!cfg.delta_only);
        assert!(cfg.model.is_empty());
    }

    #[test]
    fn test_snake_case_aliases_and_negative_layer() {
        let cfg = parse(&[
            "tasktracker-jsonl", "convert",
            "--input_dir", "acts", "--output", "o.jsonl", "--split", "train",
            "--layer", "-3", "--pool", "mean", "--label_mode", "filename",
            "--delta_only", "--max_rows", "10", "--model", "phi3", "--format", "npy",
        ]);
        assert_eq!(cfg.input_dir, PathBuf::from("acts"));
        assert_eq!(cfg.layer, -3);
        assert_eq!(cfg.pool, Pooling::Mean);
        assert!(cfg.delta_only);
        assert_eq!(cfg.max_rows, 10);
        assert_eq!(cfg.model, "phi3");
        assert_eq!(cfg.format, ArtifactFormat::Npy);
    }

    #[test]
    fn test_rejects_unknown_split() {
        let res = Cli::try_parse_from([
            "tasktracker-jsonl", "convert", "--input-dir", "in", "--output", "o", "--split", "dev",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_split_is_required() {
        let res = Cli::try_parse_from(["tasktracker-jsonl", "convert", "--input-dir", "in", "--output", "o"]);
        assert!(res.is_err());
    }
}
