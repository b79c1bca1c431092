//! Raw element probes reported by the page, and their conversion into items
//!
//! The page-side script only gathers facts. Classification and locator
//! synthesis happen here so recording and replay share one implementation.

use crate::error::{Result, SnapcheckError};
use crate::locator::{ElementIdentity, LocatorSynthesizer};
use crate::types::{BoundingBox, VisibleItem};
use crate::visibility::{is_visible, ComputedStyle};
use serde::{Deserialize, Serialize};

/// Everything the page reports about one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementProbe {
    pub tag: String,
    #[serde(flatten)]
    pub identity: ElementIdentity,
    pub rect: BoundingBox,
    #[serde(default)]
    pub style: ComputedStyle,
    /// Raw inner text, before normalization
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub scroll_y: f64,
}

/// Where a probe lands after classification
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeClass {
    Visible(VisibleItem),
    /// Has text but fails the visibility test
    Hidden(VisibleItem),
    /// No text content; never becomes an item
    Empty,
}

impl ElementProbe {
    /// Parse a bridge payload (one JSON object per element)
    pub fn from_payload(payload: &str) -> Result<Self> {
        serde_json::from_str(payload)
            .map_err(|e| SnapcheckError::Bridge(format!("Malformed element payload: {}", e)))
    }

    pub fn classify(&self, synthesizer: &LocatorSynthesizer) -> ProbeClass {
        let text = normalize_text(&self.text);
        if text.is_empty() {
            return ProbeClass::Empty;
        }

        let item = VisibleItem {
            tag: self.tag.to_lowercase(),
            text,
            locator: synthesizer.synthesize(&self.identity),
            bounding_box: self.rect,
            scroll_y: self.scroll_y,
        };

        if is_visible(&self.rect, &self.style) {
            ProbeClass::Visible(item)
        } else {
            ProbeClass::Hidden(item)
        }
    }

    /// The recorded item for this element, if it is visible content
    pub fn to_item(&self, synthesizer: &LocatorSynthesizer) -> Option<VisibleItem> {
        match self.classify(synthesizer) {
            ProbeClass::Visible(item) => Some(item),
            ProbeClass::Hidden(_) | ProbeClass::Empty => None,
        }
    }
}

/// Collapse whitespace runs to a single space and trim
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One-shot extraction of the current document, split by visibility
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveExtraction {
    pub visible: Vec<VisibleItem>,
    pub hidden: Vec<VisibleItem>,
}

impl LiveExtraction {
    pub fn find_visible(&self, wanted: &VisibleItem) -> Option<&VisibleItem> {
        self.visible.iter().find(|live| live.same_content(wanted))
    }

    pub fn find_hidden(&self, wanted: &VisibleItem) -> Option<&VisibleItem> {
        self.hidden.iter().find(|live| live.same_content(wanted))
    }
}

/// Classify every probe of a full-document pass
pub fn extract_live(probes: &[ElementProbe], synthesizer: &LocatorSynthesizer) -> LiveExtraction {
    let mut extraction = LiveExtraction::default();

    for probe in probes {
        match probe.classify(synthesizer) {
            ProbeClass::Visible(item) => extraction.visible.push(item),
            ProbeClass::Hidden(item) => extraction.hidden.push(item),
            ProbeClass::Empty => {}
        }
    }

    extraction
}
