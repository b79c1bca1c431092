//! Visibility classification for rendered elements

use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};

/// The subset of an element's computed style that decides visibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: "1".to_string(),
        }
    }
}

/// True iff the element has area and is not hidden by `display`, `visibility` or `opacity`.
///
/// Opacity is compared as the browser reports it, so only an exact `"0"` counts as hidden.
pub fn is_visible(rect: &BoundingBox, style: &ComputedStyle) -> bool {
    rect.has_area()
        && style.display != "none"
        && style.visibility != "hidden"
        && style.opacity != "0"
}
