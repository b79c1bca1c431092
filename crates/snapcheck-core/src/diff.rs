//! Baseline vs live comparison for a single page
//!
//! Baseline items are a subset requirement: every one must be present and
//! visible in the live document, in baseline order, and the first miss decides
//! the verdict. Extra live content never fails a page.

use crate::probe::LiveExtraction;
use crate::types::VisibleItem;

/// Maximum characters of item text quoted in a failure reason
pub const EXCERPT_CHARS: usize = 80;

/// Why a page failed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFailure {
    MissingElement {
        tag: String,
        locator: String,
        excerpt: String,
    },
    NotVisible {
        tag: String,
        locator: String,
        excerpt: String,
    },
}

impl PageFailure {
    fn missing(item: &VisibleItem) -> Self {
        Self::MissingElement {
            tag: item.tag.clone(),
            locator: item.locator.clone(),
            excerpt: excerpt(&item.text),
        }
    }

    fn not_visible(item: &VisibleItem) -> Self {
        Self::NotVisible {
            tag: item.tag.clone(),
            locator: item.locator.clone(),
            excerpt: excerpt(&item.text),
        }
    }
}

impl std::fmt::Display for PageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingElement {
                tag,
                locator,
                excerpt,
            } => write!(f, "Missing element: <{}> \"{}\" ({})", tag, excerpt, locator),
            Self::NotVisible {
                tag,
                locator,
                excerpt,
            } => write!(f, "Element not visible: <{}> \"{}\" ({})", tag, excerpt, locator),
        }
    }
}

/// Page verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(PageFailure),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Compare baseline items against a live extraction, stopping at the first failure
pub fn diff_page(baseline: &[VisibleItem], live: &LiveExtraction) -> Verdict {
    for expected in baseline {
        match live.find_visible(expected) {
            Some(found) if found.bounding_box.has_area() => continue,
            Some(_) => return Verdict::Fail(PageFailure::not_visible(expected)),
            None if live.find_hidden(expected).is_some() => {
                return Verdict::Fail(PageFailure::not_visible(expected))
            }
            None => return Verdict::Fail(PageFailure::missing(expected)),
        }
    }

    Verdict::Pass
}

/// First `EXCERPT_CHARS` characters, with an ellipsis when cut
pub fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
