//! Screenshot artifacts for replayed pages

use crate::error::{BrowserError, Result};
use crate::page::LivePage;
use snapcheck_core::Outcome;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Writes one full-page screenshot per replayed page
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    /// Wait before capturing so late rendering lands in the image
    settle: Duration,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            settle: Duration::ZERO,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `step-<ordinal>-<success|failure>.png`
    pub fn path_for(&self, ordinal: usize, outcome: Outcome) -> PathBuf {
        self.dir.join(format!("step-{}-{}.png", ordinal, outcome))
    }

    /// Capture the page and store it.
    ///
    /// The returned path is checked to exist; a write that silently went
    /// nowhere is [`BrowserError::ArtifactWrite`].
    pub async fn capture<P: LivePage + ?Sized>(
        &self,
        page: &P,
        ordinal: usize,
        outcome: Outcome,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(ordinal, outcome);
        debug!("Screenshot target: {}", path.display());

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let data = page.capture_png().await?;
        tokio::fs::write(&path, &data).await?;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(BrowserError::ArtifactWrite { path });
        }

        info!("Screenshot saved: {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }
}
