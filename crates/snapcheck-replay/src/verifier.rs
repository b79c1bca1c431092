//! Replay verification driver
//!
//! Revisits every baseline page on a live page, strictly in order, and
//! judges each one. Content mismatches are recorded per page and never stop
//! the run; navigation, extraction and artifact errors do.

use snapcheck_browser::{ArtifactStore, LivePage};
use snapcheck_core::fail_open::fail_open_with_retries;
use snapcheck_core::{
    diff_page, extract_live, BaselineStore, LocatorSynthesizer, PageSnapshot, Result,
    SnapcheckConfig, SnapcheckError, Verdict, VerificationResult,
};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::notify::{FailureSummary, Notifier};

const NOTIFY_ATTEMPTS: usize = 2;

/// Timing knobs for a replay run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Per-page navigation budget; exceeding it aborts the run
    pub navigation_timeout: Duration,
    /// Wait after scrolling so lazy content can render
    pub settle: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            settle: Duration::from_millis(500),
        }
    }
}

impl From<&SnapcheckConfig> for ReplayConfig {
    fn from(config: &SnapcheckConfig) -> Self {
        Self {
            navigation_timeout: config.browser.navigation_timeout(),
            settle: config.replay.settle(),
        }
    }
}

/// Outcome of a full replay, one result per baseline page
#[derive(Debug, Clone, Default)]
pub struct ReplayRun {
    pub results: Vec<VerificationResult>,
}

impl ReplayRun {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.pass).count()
    }

    pub fn passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// The run-level failure signal, raised only once every page is judged
    pub fn ensure_passed(&self) -> Result<()> {
        match self.failed_count() {
            0 => Ok(()),
            failed => Err(SnapcheckError::VerificationFailed {
                failed,
                total: self.total(),
            }),
        }
    }
}

/// Drives one live page through the baseline
pub struct ReplayVerifier<'a, P: LivePage + ?Sized> {
    page: &'a P,
    synthesizer: LocatorSynthesizer,
    config: ReplayConfig,
    artifacts: Option<ArtifactStore>,
    notifier: Option<Box<dyn Notifier>>,
}

impl<'a, P: LivePage + ?Sized> ReplayVerifier<'a, P> {
    pub fn new(page: &'a P, synthesizer: LocatorSynthesizer) -> Self {
        Self {
            page,
            synthesizer,
            config: ReplayConfig::default(),
            artifacts: None,
            notifier: None,
        }
    }

    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Capture a screenshot for every judged page
    pub fn with_artifacts(mut self, artifacts: ArtifactStore) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Send failing pages to `notifier` (fail-open)
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Load the baseline, then verify it.
    ///
    /// A missing or unreadable baseline fails here, before any navigation.
    pub async fn run_from_store(&self, store: &BaselineStore) -> Result<ReplayRun> {
        let pages = store.load()?;
        info!(
            "Loaded {} baseline pages from {}",
            pages.len(),
            store.path().display()
        );
        self.run(&pages).await
    }

    /// Verify every page in ascending `page_index` order
    pub async fn run(&self, pages: &[PageSnapshot]) -> Result<ReplayRun> {
        if pages.is_empty() {
            warn!("Baseline has no pages; nothing to verify");
        }

        let mut ordered: Vec<&PageSnapshot> = pages.iter().collect();
        ordered.sort_by_key(|p| p.page_index);

        let mut run = ReplayRun::default();
        for snapshot in ordered {
            let result = self.verify_page(snapshot).await?;
            run.results.push(result);
        }

        info!(
            "Replay finished: {}/{} pages passed",
            run.total() - run.failed_count(),
            run.total()
        );
        Ok(run)
    }

    /// Reproduce one page's context and judge it
    pub async fn verify_page(&self, snapshot: &PageSnapshot) -> Result<VerificationResult> {
        let ordinal = snapshot.ordinal();
        info!("Verifying page {}: {}", ordinal, snapshot.url);

        if let Some(viewport) = snapshot.viewport {
            self.page.set_viewport(viewport).await?;
        }

        self.page
            .navigate(&snapshot.url, self.config.navigation_timeout)
            .await?;

        self.page.scroll_to(snapshot.max_scroll_y).await?;
        if !self.config.settle.is_zero() {
            tokio::time::sleep(self.config.settle).await;
        }

        let probes = self.page.probe_document().await?;
        let live = extract_live(&probes, &self.synthesizer);
        debug!(
            visible = live.visible.len(),
            hidden = live.hidden.len(),
            "Live extraction for page {}",
            ordinal
        );

        let mut result = match diff_page(&snapshot.items, &live) {
            Verdict::Pass => {
                info!("Page {} passed ({} items)", ordinal, snapshot.items.len());
                VerificationResult::passed(snapshot.clone())
            }
            Verdict::Fail(failure) => {
                warn!("Page {} failed: {}", ordinal, failure);
                VerificationResult::failed(snapshot.clone(), failure.to_string())
            }
        };

        if let Some(artifacts) = &self.artifacts {
            let path = artifacts
                .capture(self.page, ordinal, result.outcome())
                .await?;
            result = result.with_artifact(path);
        }

        if let (Some(notifier), Some(summary)) =
            (&self.notifier, FailureSummary::from_result(&result))
        {
            fail_open_with_retries("failure_notifier", || notifier.notify(&summary), NOTIFY_ATTEMPTS)
                .await;
        }

        Ok(result)
    }
}
