//! Durable baseline storage
//!
//! The baseline is a pretty-printed JSON array of page snapshots at a fixed
//! path (by default `baseline/steps.json` under the project root).

use crate::error::{Result, SnapcheckError};
use crate::types::PageSnapshot;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads and writes the recorded baseline
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Persist all pages, replacing any previous baseline.
    ///
    /// Content goes to a sibling temp file which is then renamed over the target,
    /// so readers never see a partially written baseline.
    pub fn save(&self, pages: &[PageSnapshot]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(pages)?;
        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;

        info!(
            "Saved {} pages to {}",
            pages.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load the baseline.
    ///
    /// A missing file is [`SnapcheckError::BaselineNotFound`]; content that does
    /// not parse is [`SnapcheckError::BaselineFormat`].
    pub fn load(&self) -> Result<Vec<PageSnapshot>> {
        if !self.exists() {
            return Err(SnapcheckError::BaselineNotFound {
                path: self.path.clone(),
            });
        }

        let content = std::fs::read_to_string(&self.path)?;
        let mut pages: Vec<PageSnapshot> =
            serde_json::from_str(&content).map_err(|source| SnapcheckError::BaselineFormat {
                path: self.path.clone(),
                source,
            })?;

        pages.sort_by_key(|p| p.page_index);
        debug!("Loaded {} pages from {}", pages.len(), self.path.display());
        Ok(pages)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Viewport, VisibleItem};
    use tempfile::TempDir;

    fn sample_pages() -> Vec<PageSnapshot> {
        let mut home = PageSnapshot::new(0, "https://example.com/home", Some(Viewport::new(1280, 800)));
        home.items.push(VisibleItem {
            tag: "h1".to_string(),
            text: "Welcome".to_string(),
            locator: "#title".to_string(),
            bounding_box: BoundingBox::new(0.0, 0.0, 200.0, 40.0),
            scroll_y: 0.0,
        });
        let about = PageSnapshot::new(1, "https://example.com/about", None);
        vec![home, about]
    }

    #[test]
    fn test_save_creates_directories_and_loads_back() {
        let temp = TempDir::new().unwrap();
        let store = BaselineStore::new(temp.path().join("nested/baseline/steps.json"));

        store.save(&sample_pages()).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, sample_pages());
        assert!(!temp.path().join("nested/baseline/steps.json.tmp").exists());
    }

    #[test]
    fn test_save_overwrites() {
        let temp = TempDir::new().unwrap();
        let store = BaselineStore::new(temp.path().join("steps.json"));

        store.save(&sample_pages()).unwrap();
        store.save(&sample_pages()[..1]).unwrap();

        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_baseline_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = BaselineStore::new(temp.path().join("steps.json"));

        assert!(matches!(
            store.load(),
            Err(SnapcheckError::BaselineNotFound { .. })
        ));
    }

    #[test]
    fn test_garbage_is_format_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("steps.json");
        std::fs::write(&path, r#"{"contentSnapshot": {"visibleText": []}}"#).unwrap();

        assert!(matches!(
            BaselineStore::new(path).load(),
            Err(SnapcheckError::BaselineFormat { .. })
        ));
    }

    #[test]
    fn test_load_orders_by_page_index() {
        let temp = TempDir::new().unwrap();
        let store = BaselineStore::new(temp.path().join("steps.json"));
        let mut pages = sample_pages();
        pages.reverse();
        std::fs::write(store.path(), serde_json::to_string(&pages).unwrap()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded[0].page_index, 0);
        assert_eq!(loaded[1].page_index, 1);
    }
}
