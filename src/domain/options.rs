// ============================================================
// Layer 3: Run Options
// ============================================================
// The small closed sets of choices a conversion run is made of.
// Each implements FromStr so the CLI layer can parse them
// without this layer depending on clap, and Serialize so the
// application config can be logged/saved as JSON.

use std::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

use crate::domain::error::ConvertError;

// ─── Split ────────────────────────────────────────────────────────────────────
/// Which dataset split the artifacts belong to.
///
/// The split decides the axis-0 convention of every artifact:
///   train    → [3, B, L, D]  (primary, clean, poisoned)
///   val/test → [2, B, L, D]  (primary, full text)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    #[default]
    Train,
    Val,
    Test,
}

impl Split {
    /// Number of stacked slices along axis 0 for this split
    pub fn expected_slices(self) -> usize {
        match self {
            Split::Train => 3,
            Split::Val | Split::Test => 2,
        }
    }

    pub fn is_train(self) -> bool {
        self == Split::Train
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val   => "val",
            Split::Test  => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Split::Train),
            "val"   => Ok(Split::Val),
            "test"  => Ok(Split::Test),
            other   => Err(format!("invalid split '{other}' (expected train, val or test)")),
        }
    }
}

// ─── Pooling ──────────────────────────────────────────────────────────────────
/// How the layer axis is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    /// Pick a single layer by (possibly negative) index
    #[default]
    Layer,
    /// Arithmetic mean over all layers
    Mean,
}

impl FromStr for Pooling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "layer" => Ok(Pooling::Layer),
            "mean"  => Ok(Pooling::Mean),
            other   => Err(format!("invalid pool '{other}' (expected layer or mean)")),
        }
    }
}

// ─── LabelMode ────────────────────────────────────────────────────────────────
/// Source of evaluation labels. Only the filename convention exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    #[default]
    Filename,
}

impl FromStr for LabelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filename" => Ok(LabelMode::Filename),
            other      => Err(format!("invalid label mode '{other}' (expected filename)")),
        }
    }
}

// ─── OutputMode ───────────────────────────────────────────────────────────────
/// Record body shape: `{delta}` or `{before, after}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    DeltaOnly,
    #[default]
    BeforeAfter,
}

impl OutputMode {
    pub fn from_delta_only(delta_only: bool) -> Self {
        if delta_only { OutputMode::DeltaOnly } else { OutputMode::BeforeAfter }
    }
}

// ─── ArtifactFormat ───────────────────────────────────────────────────────────
/// On-disk container of the activation artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// PyTorch archive written by torch.save
    #[default]
    Pt,
    /// NumPy .npy array
    Npy,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Pt  => "pt",
            ArtifactFormat::Npy => "npy",
        }
    }
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pt"  => Ok(ArtifactFormat::Pt),
            "npy" => Ok(ArtifactFormat::Npy),
            other => Err(format!("invalid format '{other}' (expected pt or npy)")),
        }
    }
}

// ─── Reduction ────────────────────────────────────────────────────────────────
/// The single reduction applied to every slice of every artifact in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Select one layer. Negative indices count from the end.
    Layer { index: i64 },
    Mean,
}

impl Reduction {
    /// Combine the pooling mode with the layer index option.
    /// The index is ignored entirely under mean pooling.
    pub fn new(pooling: Pooling, layer: i64) -> Self {
        match pooling {
            Pooling::Layer => Reduction::Layer { index: layer },
            Pooling::Mean  => Reduction::Mean,
        }
    }

    /// Value written to `meta.layer`: the index exactly as supplied, or "mean"
    pub fn descriptor(&self) -> String {
        match self {
            Reduction::Layer { index } => index.to_string(),
            Reduction::Mean            => "mean".to_string(),
        }
    }

    /// Resolve the layer index against `layers`, or `None` for mean pooling.
    pub fn resolve(&self, layers: usize) -> Result<Option<usize>, ConvertError> {
        match *self {
            Reduction::Layer { index } => resolve_layer_index(index, layers).map(Some),
            Reduction::Mean            => Ok(None),
        }
    }
}

/// Map a signed index onto `0..layers` with Python-style negative indexing.
pub fn resolve_layer_index(index: i64, layers: usize) -> Result<usize, ConvertError> {
    let len = layers as i64;
    let resolved = if index < 0 { len + index } else { index };

    if resolved < 0 || resolved >= len {
        return Err(ConvertError::Index { index, layers });
    }
    Ok(resolved as usize)
}
