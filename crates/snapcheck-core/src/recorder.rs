//! Incremental, deduplicated page recording
//!
//! Pure state machine with NO I/O. The recording session driver feeds it
//! visibility and navigation events one at a time and persists what
//! [`SnapshotRecorder::finish`] hands back.
//!
//! Lifecycle: construct (collecting the initial page) -> observe/navigate ->
//! finish. A finished recorder rejects further events; start a new one instead.

use crate::error::{Result, SnapcheckError};
use crate::types::{PageSnapshot, Viewport, VisibleItem};
use std::collections::HashSet;
use tracing::debug;

/// Recorder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    CollectingPage,
    Finished,
}

/// What happened to an observed item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Recorded,
    Duplicate,
}

/// Identity of an item within one page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    locator: String,
    text: String,
}

impl DedupKey {
    fn of(item: &VisibleItem) -> Self {
        Self {
            locator: item.locator.clone(),
            text: item.text.clone(),
        }
    }
}

/// Owns the in-progress page and every finalized page of one session
#[derive(Debug)]
pub struct SnapshotRecorder {
    state: RecorderState,
    finalized: Vec<PageSnapshot>,
    current: PageSnapshot,
    seen: HashSet<DedupKey>,
}

impl SnapshotRecorder {
    /// Start collecting the initial page
    pub fn new(initial_url: impl Into<String>, viewport: Option<Viewport>) -> Self {
        Self {
            state: RecorderState::CollectingPage,
            finalized: Vec::new(),
            current: PageSnapshot::new(0, initial_url, viewport),
            seen: HashSet::new(),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == RecorderState::Finished
    }

    /// The page currently being collected
    pub fn current_page(&self) -> &PageSnapshot {
        &self.current
    }

    /// Pages recorded so far, including the one in progress
    pub fn page_count(&self) -> usize {
        self.finalized.len() + 1
    }

    /// Record one visibility event.
    ///
    /// `maxScrollY` advances even when the item itself is a duplicate.
    pub fn observe(&mut self, item: VisibleItem) -> Result<Observation> {
        self.ensure_collecting()?;

        if item.scroll_y > self.current.max_scroll_y {
            self.current.max_scroll_y = item.scroll_y;
        }

        if self.seen.insert(DedupKey::of(&item)) {
            self.current.items.push(item);
            Ok(Observation::Recorded)
        } else {
            Ok(Observation::Duplicate)
        }
    }

    /// Primary-document navigation: finalize the current page and start the next.
    ///
    /// Returns the index of the new page.
    pub fn navigate(&mut self, url: impl Into<String>, viewport: Option<Viewport>) -> Result<usize> {
        self.ensure_collecting()?;

        let next_index = self.current.page_index + 1;
        let next = PageSnapshot::new(next_index, url, viewport);
        let done = std::mem::replace(&mut self.current, next);

        debug!(
            page_index = done.page_index,
            items = done.items.len(),
            "Finalized page"
        );

        self.finalized.push(done);
        self.seen.clear();
        Ok(next_index)
    }

    /// Enter the terminal state and hand back every page, exactly once.
    ///
    /// Later calls return `None`.
    pub fn finish(&mut self) -> Option<Vec<PageSnapshot>> {
        if self.is_finished() {
            return None;
        }
        self.state = RecorderState::Finished;

        let last = std::mem::replace(&mut self.current, PageSnapshot::new(0, String::new(), None));
        let mut pages = std::mem::take(&mut self.finalized);
        pages.push(last);
        self.seen.clear();
        Some(pages)
    }

    fn ensure_collecting(&self) -> Result<()> {
        match self.state {
            RecorderState::CollectingPage => Ok(()),
            RecorderState::Finished => Err(SnapcheckError::RecorderFinished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn item(locator: &str, text: &str, scroll_y: f64) -> VisibleItem {
        VisibleItem {
            tag: "p".to_string(),
            text: text.to_string(),
            locator: locator.to_string(),
            bounding_box: BoundingBox::new(0.0, 0.0, 100.0, 20.0),
            scroll_y,
        }
    }

    #[test]
    fn test_starts_collecting_initial_page() {
        let recorder = SnapshotRecorder::new("https://example.com/", Some(Viewport::new(1280, 800)));
        assert_eq!(recorder.state(), RecorderState::CollectingPage);
        assert_eq!(recorder.current_page().page_index, 0);
        assert_eq!(recorder.current_page().url, "https://example.com/");
        assert_eq!(recorder.page_count(), 1);
    }

    #[test]
    fn test_dedup_by_locator_and_text() {
        let mut recorder = SnapshotRecorder::new("/", None);

        assert_eq!(recorder.observe(item("#a", "one", 0.0)).unwrap(), Observation::Recorded);
        assert_eq!(recorder.observe(item("#a", "one", 0.0)).unwrap(), Observation::Duplicate);
        // Same locator, new text is a new item
        assert_eq!(recorder.observe(item("#a", "two", 0.0)).unwrap(), Observation::Recorded);
        assert_eq!(recorder.observe(item("#b", "one", 0.0)).unwrap(), Observation::Recorded);

        let texts: Vec<_> = recorder
            .current_page()
            .items
            .iter()
            .map(|i| (i.locator.as_str(), i.text.as_str()))
            .collect();
        assert_eq!(texts, vec![("#a", "one"), ("#a", "two"), ("#b", "one")]);
    }

    #[test]
    fn test_max_scroll_counts_duplicates() {
        let mut recorder = SnapshotRecorder::new("/", None);
        recorder.observe(item("#a", "one", 100.0)).unwrap();
        recorder.observe(item("#a", "one", 900.0)).unwrap();
        recorder.observe(item("#b", "two", 300.0)).unwrap();

        assert_eq!(recorder.current_page().items.len(), 2);
        assert_eq!(recorder.current_page().max_scroll_y, 900.0);
    }

    #[test]
    fn test_navigation_starts_new_page_with_fresh_dedup() {
        let mut recorder = SnapshotRecorder::new("/home", None);
        recorder.observe(item("#a", "one", 50.0)).unwrap();

        let index = recorder.navigate("/about", Some(Viewport::new(800, 600))).unwrap();
        assert_eq!(index, 1);
        assert_eq!(recorder.current_page().max_scroll_y, 0.0);

        // Seen on the previous page only, so recorded again here
        assert_eq!(recorder.observe(item("#a", "one", 0.0)).unwrap(), Observation::Recorded);

        let pages = recorder.finish().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].url, "/home");
        assert_eq!(pages[0].max_scroll_y, 50.0);
        assert_eq!(pages[1].page_index, 1);
        assert_eq!(pages[1].viewport, Some(Viewport::new(800, 600)));
        assert_eq!(pages[1].items.len(), 1);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut recorder = SnapshotRecorder::new("/", None);
        recorder.observe(item("#a", "one", 0.0)).unwrap();

        assert!(recorder.finish().is_some());
        assert!(recorder.finish().is_none());
        assert!(recorder.is_finished());
    }

    #[test]
    fn test_finished_recorder_rejects_events() {
        let mut recorder = SnapshotRecorder::new("/", None);
        recorder.finish();

        assert!(matches!(
            recorder.observe(item("#a", "one", 0.0)),
            Err(SnapcheckError::RecorderFinished)
        ));
        assert!(matches!(
            recorder.navigate("/next", None),
            Err(SnapcheckError::RecorderFinished)
        ));
    }

    #[test]
    fn test_page_indices_strictly_increase() {
        let mut recorder = SnapshotRecorder::new("/0", None);
        for n in 1..5 {
            recorder.navigate(format!("/{}", n), None).unwrap();
        }
        let pages = recorder.finish().unwrap();
        let indices: Vec<_> = pages.iter().map(|p| p.page_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }
}
