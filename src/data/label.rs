// ============================================================
// Layer 4: Filename Label Resolver
// ============================================================
// Val/test artifacts carry no label inside them. The label
// comes from the filename, and only two names are accepted:
//
//   activations_0.<ext> → clean    (y = 0)
//   activations_1.<ext> → poisoned (y = 1)
//
// Exact match only: no case folding, no prefix matching and no
// default label. Anything else is a LabelError.

use crate::domain::{error::ConvertError, options::ArtifactFormat};

const CLEAN_STEM:    &str = "activations_0";
const POISONED_STEM: &str = "activations_1";

pub fn infer_label_from_filename(
    file_name: &str,
    format:    ArtifactFormat,
) -> Result<u8, ConvertError> {
    let clean    = format!("{CLEAN_STEM}.{}", format.extension());
    let poisoned = format!("{POISONED_STEM}.{}", format.extension());

    if file_name == clean {
        Ok(0)
    } else if file_name == poisoned {
        Ok(1)
    } else {
        Err(ConvertError::Label {
            file: file_name.to_string(),
            clean,
            poisoned,
        })
    }
}
