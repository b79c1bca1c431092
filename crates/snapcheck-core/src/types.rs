//! Core data model: recorded items, page snapshots and verification results

use serde::{Deserialize, Serialize};

/// Element geometry relative to the viewport, as reported by the browser
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Both dimensions strictly positive
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Browser viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A piece of visible text content observed on a page
///
/// `text` is whitespace-normalized and never empty; construction goes through
/// [`crate::probe::ElementProbe::to_item`], which enforces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleItem {
    pub tag: String,
    pub text: String,
    pub locator: String,
    pub bounding_box: BoundingBox,
    pub scroll_y: f64,
}

impl VisibleItem {
    /// Same logical element: equal tag, text and locator
    pub fn same_content(&self, other: &VisibleItem) -> bool {
        self.tag == other.tag && self.text == other.text && self.locator == other.locator
    }
}

/// Everything recorded for one navigation during a recording session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub page_index: usize,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub max_scroll_y: f64,
    #[serde(default)]
    pub items: Vec<VisibleItem>,
}

impl PageSnapshot {
    pub fn new(page_index: usize, url: impl Into<String>, viewport: Option<Viewport>) -> Self {
        Self {
            page_index,
            url: url.into(),
            viewport,
            max_scroll_y: 0.0,
            items: Vec::new(),
        }
    }

    /// 1-based position used in artifact names and reports
    pub fn ordinal(&self) -> usize {
        self.page_index + 1
    }
}

/// Page outcome, used for artifact naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Judgment for one baseline page after replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    #[serde(flatten)]
    pub snapshot: PageSnapshot,
    pub pass: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<std::path::PathBuf>,
}

impl VerificationResult {
    pub fn passed(snapshot: PageSnapshot) -> Self {
        Self {
            snapshot,
            pass: true,
            failure_reason: None,
            artifact_path: None,
        }
    }

    pub fn failed(snapshot: PageSnapshot, reason: impl Into<String>) -> Self {
        Self {
            snapshot,
            pass: false,
            failure_reason: Some(reason.into()),
            artifact_path: None,
        }
    }

    pub fn outcome(&self) -> Outcome {
        if self.pass {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    pub fn with_artifact(mut self, path: std::path::PathBuf) -> Self {
        self.artifact_path = Some(path);
        self
    }
}
