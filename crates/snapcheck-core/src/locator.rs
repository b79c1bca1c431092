//! Stable element locators
//!
//! A locator has to come out identical when the same document structure is
//! walked twice, once while recording and once during replay. Resolution order:
//!
//! 1. `#<id>` when the element has a non-empty id
//! 2. `[<test-attribute>="<value>"]` when the configured test attribute is set
//! 3. a structural path from below the root container down to the element,
//!    `tag` or `tag:nth-of-type(k)` per level, joined with `" > "`

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default attribute used by test suites to tag elements
pub const DEFAULT_TEST_ATTRIBUTE: &str = "data-testid";

/// One level of an element's ancestry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    /// Lowercase tag name
    pub tag: String,
    /// 1-based position among siblings sharing the tag
    pub index: usize,
    /// Number of siblings (including this one) sharing the tag
    pub count: usize,
}

impl PathSegment {
    pub fn new(tag: impl Into<String>, index: usize, count: usize) -> Self {
        Self {
            tag: tag.into(),
            index,
            count,
        }
    }

    fn render(&self) -> String {
        if self.count > 1 {
            format!("{}:nth-of-type({})", self.tag, self.index)
        } else {
            self.tag.clone()
        }
    }
}

/// Structural facts about an element needed to build its locator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementIdentity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub test_id: Option<String>,
    /// Root-to-leaf ancestry, excluding the root container
    #[serde(default)]
    pub path: Vec<PathSegment>,
    /// Whether the ancestry walk reached the root container
    #[serde(default)]
    pub reached_root: bool,
}

impl ElementIdentity {
    /// The ancestry walk stopped short of the root container
    pub fn is_partial(&self) -> bool {
        !self.reached_root
    }
}

/// Deterministic element -> locator mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSynthesizer {
    test_attribute: String,
}

impl Default for LocatorSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_TEST_ATTRIBUTE)
    }
}

impl LocatorSynthesizer {
    pub fn new(test_attribute: impl Into<String>) -> Self {
        Self {
            test_attribute: test_attribute.into(),
        }
    }

    pub fn test_attribute(&self) -> &str {
        &self.test_attribute
    }

    /// Build the locator for an element.
    ///
    /// An element detached from the root container yields whatever partial path
    /// its ancestry provides; that is not an error, it just won't match on replay
    /// if the structure changed.
    pub fn synthesize(&self, element: &ElementIdentity) -> String {
        if let Some(id) = non_empty(&element.id) {
            return format!("#{}", id);
        }

        if let Some(value) = non_empty(&element.test_id) {
            return format!("[{}=\"{}\"]", self.test_attribute, value);
        }

        let locator = element
            .path
            .iter()
            .map(PathSegment::render)
            .collect::<Vec<_>>()
            .join(" > ");
        if element.is_partial() {
            debug!(locator = %locator, "Element detached from root container; using partial path");
        }
        locator
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
