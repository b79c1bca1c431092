//! Recording session driver
//!
//! Consumes the bridge event stream, feeds the [`SnapshotRecorder`], and
//! persists the baseline exactly once when the session ends.

use crate::bridge::{BridgeEvent, ShutdownReason};
use crate::error::Result;
use crate::page::RecordingTarget;
use snapcheck_core::fail_open::fail_open_sync;
use snapcheck_core::{BaselineStore, ElementProbe, LocatorSynthesizer, Observation, SnapshotRecorder};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

/// What a finished session captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSummary {
    pub pages: usize,
    pub items: usize,
    pub reason: ShutdownReason,
}

/// One recording run over a user-driven page
pub struct RecordingSession<'a, T: RecordingTarget + ?Sized> {
    target: &'a T,
    store: BaselineStore,
    synthesizer: LocatorSynthesizer,
}

impl<'a, T: RecordingTarget + ?Sized> RecordingSession<'a, T> {
    pub fn new(target: &'a T, store: BaselineStore, synthesizer: LocatorSynthesizer) -> Self {
        Self {
            target,
            store,
            synthesizer,
        }
    }

    /// Record until a shutdown trigger arrives (or every sender is gone), then
    /// save the baseline.
    ///
    /// Events are handled strictly one at a time. Anything arriving after the
    /// first shutdown is discarded, so concurrent triggers produce one write.
    pub async fn run(self, mut events: UnboundedReceiver<BridgeEvent>) -> Result<RecordingSummary> {
        let url = self.target.current_url().await?;
        let viewport = self.target.viewport().await?;
        let mut recorder = SnapshotRecorder::new(url.clone(), viewport);

        self.target.install_observer().await?;
        info!("Recording {} - navigate and scroll, close the browser to stop", url);

        let reason = loop {
            let Some(event) = events.recv().await else {
                debug!("All bridge senders dropped");
                break ShutdownReason::Stopped;
            };

            match event {
                BridgeEvent::Element(payload) => self.handle_element(&mut recorder, &payload)?,
                BridgeEvent::Navigated {
                    url,
                    main_frame: true,
                } => {
                    if let Err(e) = self.handle_navigation(&mut recorder, url).await {
                        warn!("Navigation handling failed, saving captured pages: {}", e);
                        events.close();
                        self.flush(&mut recorder, ShutdownReason::Stopped)?;
                        return Err(e);
                    }
                }
                BridgeEvent::Navigated { url, .. } => debug!("Ignoring sub-frame navigation to {}", url),
                BridgeEvent::Shutdown(reason) => break reason,
            }
        };

        events.close();
        self.flush(&mut recorder, reason)
    }

    /// A bad payload costs one item, never the session
    fn handle_element(&self, recorder: &mut SnapshotRecorder, payload: &str) -> Result<()> {
        let Some(probe) = fail_open_sync("bridge_element", ElementProbe::from_payload(payload)) else {
            return Ok(());
        };

        if let Some(item) = probe.to_item(&self.synthesizer) {
            if recorder.observe(item)? == Observation::Recorded {
                debug!(
                    page_index = recorder.current_page().page_index,
                    items = recorder.current_page().items.len(),
                    "Recorded item"
                );
            }
        }
        Ok(())
    }

    async fn handle_navigation(&self, recorder: &mut SnapshotRecorder, url: String) -> Result<()> {
        let viewport = self.target.viewport().await?;
        let index = recorder.navigate(url.clone(), viewport)?;
        info!("Page {} started: {}", index + 1, url);

        self.target.install_observer().await
    }

    fn flush(&self, recorder: &mut SnapshotRecorder, reason: ShutdownReason) -> Result<RecordingSummary> {
        let Some(pages) = recorder.finish() else {
            return Err(snapcheck_core::SnapcheckError::RecorderFinished);
        };

        info!("Recording finished ({})", reason);
        self.store.save(&pages)?;

        Ok(RecordingSummary {
            pages: pages.len(),
            items: pages.iter().map(|p| p.items.len()).sum(),
            reason,
        })
    }
}
