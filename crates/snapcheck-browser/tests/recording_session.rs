//! Integration tests for the recording session driver
//!
//! Drives the session through the bridge channel exactly as the CDP listener
//! would, against an in-memory target, and checks what lands in the baseline.

use async_trait::async_trait;
use snapcheck_browser::bridge::event_channel;
use snapcheck_browser::{BridgeEvent, RecordingSession, RecordingTarget, ShutdownHandle, ShutdownReason};
use snapcheck_core::visibility::ComputedStyle;
use snapcheck_core::{
    BaselineStore, BoundingBox, ElementIdentity, ElementProbe, LocatorSynthesizer, PathSegment,
    Result, SnapcheckError, Viewport,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Target that counts observer installs and can fail the Nth one
struct FakeTarget {
    url: String,
    installs: AtomicUsize,
    fail_install_at: Option<usize>,
}

impl FakeTarget {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            installs: AtomicUsize::new(0),
            fail_install_at: None,
        }
    }
}

#[async_trait]
impl RecordingTarget for FakeTarget {
    async fn current_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn viewport(&self) -> Result<Option<Viewport>> {
        Ok(Some(Viewport::new(1280, 800)))
    }

    async fn install_observer(&self) -> Result<()> {
        let n = self.installs.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_install_at == Some(n) {
            return Err(SnapcheckError::Browser("document torn down".to_string()));
        }
        Ok(())
    }
}

fn payload(id: &str, text: &str, scroll_y: f64) -> BridgeEvent {
    let probe = ElementProbe {
        tag: "p".to_string(),
        identity: ElementIdentity {
            id: Some(id.to_string()),
            test_id: None,
            path: vec![PathSegment::new("p", 1, 1)],
            reached_root: true,
        },
        rect: BoundingBox::new(0.0, 0.0, 300.0, 20.0),
        style: ComputedStyle::default(),
        text: text.to_string(),
        scroll_y,
    };
    BridgeEvent::Element(serde_json::to_string(&probe).unwrap())
}

fn navigated(url: &str, main_frame: bool) -> BridgeEvent {
    BridgeEvent::Navigated {
        url: url.to_string(),
        main_frame,
    }
}

fn store(temp: &TempDir) -> BaselineStore {
    BaselineStore::new(temp.path().join("baseline/steps.json"))
}

#[tokio::test]
async fn test_records_pages_until_shutdown() {
    let temp = TempDir::new().unwrap();
    let target = FakeTarget::new("https://app.test/home");
    let (tx, rx) = event_channel();

    for event in [
        payload("title", "Welcome", 0.0),
        payload("title", "Welcome", 400.0),
        payload("intro", "  Hello\n  there ", 120.0),
        navigated("https://ads.test/frame", false),
        navigated("https://app.test/about", true),
        payload("title", "About us", 0.0),
        BridgeEvent::Shutdown(ShutdownReason::BrowserClosed),
    ] {
        tx.send(event).unwrap();
    }

    let summary = RecordingSession::new(&target, store(&temp), LocatorSynthesizer::default())
        .run(rx)
        .await
        .unwrap();

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.items, 3);
    assert_eq!(summary.reason, ShutdownReason::BrowserClosed);
    // Initial page plus one main-frame navigation
    assert_eq!(target.installs.load(Ordering::SeqCst), 2);

    let pages = store(&temp).load().unwrap();
    assert_eq!(pages[0].url, "https://app.test/home");
    assert_eq!(pages[0].max_scroll_y, 400.0);
    assert_eq!(pages[0].items[1].text, "Hello there");
    assert_eq!(pages[0].items[1].locator, "#intro");
    assert_eq!(pages[1].page_index, 1);
    assert_eq!(pages[1].url, "https://app.test/about");
    assert_eq!(pages[1].viewport, Some(Viewport::new(1280, 800)));
}

#[tokio::test]
async fn test_bad_payload_drops_only_that_item() {
    let temp = TempDir::new().unwrap();
    let target = FakeTarget::new("/");
    let (tx, rx) = event_channel();

    tx.send(BridgeEvent::Element("{\"error\":\"TypeError\"}".to_string())).unwrap();
    tx.send(BridgeEvent::Element("not json".to_string())).unwrap();
    tx.send(payload("ok", "Still here", 0.0)).unwrap();
    tx.send(BridgeEvent::Shutdown(ShutdownReason::Stopped)).unwrap();

    let summary = RecordingSession::new(&target, store(&temp), LocatorSynthesizer::default())
        .run(rx)
        .await
        .unwrap();

    assert_eq!(summary.items, 1);
    assert_eq!(store(&temp).load().unwrap()[0].items[0].text, "Still here");
}

#[tokio::test]
async fn test_concurrent_shutdowns_write_once() {
    let temp = TempDir::new().unwrap();
    let target = FakeTarget::new("/");
    let (tx, rx) = event_channel();
    let handle = ShutdownHandle::new(tx.clone());

    tx.send(payload("a", "First", 0.0)).unwrap();
    assert!(handle.shutdown(ShutdownReason::Interrupted));
    assert!(handle.shutdown(ShutdownReason::BrowserClosed));
    // Arrives after shutdown; must not reach the baseline
    tx.send(payload("b", "Late", 0.0)).unwrap();

    let summary = RecordingSession::new(&target, store(&temp), LocatorSynthesizer::default())
        .run(rx)
        .await
        .unwrap();

    assert_eq!(summary.reason, ShutdownReason::Interrupted);
    let pages = store(&temp).load().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].items.len(), 1);

    // Session is gone; further triggers are rejected rather than rewriting
    assert!(!handle.stop());
}

#[tokio::test]
async fn test_dropped_senders_flush() {
    let temp = TempDir::new().unwrap();
    let target = FakeTarget::new("/");
    let (tx, rx) = event_channel();

    tx.send(payload("a", "Only", 0.0)).unwrap();
    drop(tx);

    let summary = RecordingSession::new(&target, store(&temp), LocatorSynthesizer::default())
        .run(rx)
        .await
        .unwrap();

    assert_eq!(summary.reason, ShutdownReason::Stopped);
    assert!(store(&temp).exists());
}

#[tokio::test]
async fn test_navigation_failure_saves_then_errors() {
    let temp = TempDir::new().unwrap();
    let mut target = FakeTarget::new("/start");
    target.fail_install_at = Some(2);
    let (tx, rx) = event_channel();

    tx.send(payload("a", "Captured", 0.0)).unwrap();
    tx.send(navigated("/next", true)).unwrap();
    tx.send(BridgeEvent::Shutdown(ShutdownReason::Stopped)).unwrap();

    let err = RecordingSession::new(&target, store(&temp), LocatorSynthesizer::default())
        .run(rx)
        .await
        .unwrap_err();

    assert!(matches!(err, SnapcheckError::Browser(_)));
    let pages = store(&temp).load().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].items[0].text, "Captured");
}

#[tokio::test]
async fn test_hidden_and_empty_elements_not_recorded() {
    let temp = TempDir::new().unwrap();
    let target = FakeTarget::new("/");
    let (tx, rx) = event_channel();

    let hidden = ElementProbe {
        tag: "div".to_string(),
        identity: ElementIdentity::default(),
        rect: BoundingBox::new(0.0, 0.0, 100.0, 20.0),
        style: ComputedStyle {
            visibility: "hidden".to_string(),
            ..ComputedStyle::default()
        },
        text: "Secret".to_string(),
        scroll_y: 900.0,
    };
    tx.send(BridgeEvent::Element(serde_json::to_string(&hidden).unwrap())).unwrap();
    tx.send(payload("blank", "   ", 0.0)).unwrap();
    tx.send(BridgeEvent::Shutdown(ShutdownReason::Stopped)).unwrap();

    let summary = RecordingSession::new(&target, store(&temp), LocatorSynthesizer::default())
        .run(rx)
        .await
        .unwrap();

    assert_eq!(summary.items, 0);
    // Non-items never move the scroll high-water mark
    assert_eq!(store(&temp).load().unwrap()[0].max_scroll_y, 0.0);
}
