// ============================================================
// Layer 3: Output Record
// ============================================================
// One JSONL line. Two body shapes exist:
//
//   delta-only:   {"delta": [..D..], "y": 0|1, "meta": {...}}
//   before/after: {"before": [..D..], "after": [..D..], "y": 0|1, "meta": {...}}
//
// Field order in the serialised line is body, y, meta; serde
// emits struct fields in declaration order and `flatten`
// splices the body fields in first.

use serde::Serialize;

use crate::domain::options::Split;

/// Which intervention a training record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Clean,
    Poisoned,
}

impl Variant {
    /// Training labels are fixed by construction
    pub fn label(self) -> u8 {
        match self {
            Variant::Clean    => 0,
            Variant::Poisoned => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Delta {
        delta: Vec<f32>,
    },
    BeforeAfter {
        before: Vec<f32>,
        after:  Vec<f32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub src:   String,
    pub split: Split,
    /// Present on training records only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    /// Layer index as supplied, or "mean"
    pub layer: String,
    pub model: String,
    pub example_idx: usize,
    pub batch_size:  usize,
    pub layers:      usize,
    pub dim:         usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(flatten)]
    pub body: Body,
    pub y:    u8,
    pub meta: Meta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(variant: Option<Variant>) -> Meta {
        Meta {
            src:         "activations_0.pt".into(),
            split:       if variant.is_some() { Split::Train } else { Split::Test },
            variant,
            layer:       "-1".into(),
            model:       String::new(),
            example_idx: 1,
            batch_size:  2,
            layers:      4,
            dim:         2,
        }
    }

    #[test]
    fn test_delta_record_field_order() {
        let rec = Record {
            body: Body::Delta { delta: vec![0.5, -1.0] },
            y:    1,
            meta: meta(Some(Variant::Poisoned)),
        };
        let line = serde_json::to_string(&rec).unwrap();
        assert_eq!(
            line,
            r#"{"delta":[0.5,-1.0],"y":1,"meta":{"src":"activations_0.pt","split":"train","variant":"poisoned","layer":"-1","model":"","example_idx":1,"batch_size":2,"layers":4,"dim":2}}"#
        );
    }

    #[test]
    fn test_eval_record_omits_variant() {
        let rec = Record {
            body: Body::BeforeAfter { before: vec![1.0], after: vec![2.0] },
            y:    0,
            meta: meta(None),
        };
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["before"], serde_json::json!([1.0]));
        assert_eq!(value["after"],  serde_json::json!([2.0]));
        assert_eq!(value["meta"]["split"], "test");
        assert!(value["meta"].get("variant").is_none());
        assert!(value.get("delta").is_none());
    }

    #[test]
    fn test_variant_labels() {
        assert_eq!(Variant::Clean.label(),    0);
        assert_eq!(Variant::Poisoned.label(), 1);
    }
}
