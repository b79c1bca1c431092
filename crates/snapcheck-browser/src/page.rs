//! The seam between the verification engine and a live browser page
//!
//! [`crate::browser::BrowserSession`] implements both traits over CDP. Tests
//! implement them over in-memory documents.

use async_trait::async_trait;
use snapcheck_core::{ElementProbe, Result, Viewport};
use std::time::Duration;

/// Operations replay needs from a live page
#[async_trait]
pub trait LivePage: Send + Sync {
    /// Emulate the recorded viewport (inner size, not window size) before navigating
    async fn set_viewport(&self, viewport: Viewport) -> Result<()>;

    /// Navigate and wait for the load to finish; exceeding `timeout` is
    /// [`snapcheck_core::SnapcheckError::NavigationTimeout`]
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    async fn scroll_to(&self, y: f64) -> Result<()>;

    /// One raw probe per element under the root container, in document order
    async fn probe_document(&self) -> Result<Vec<ElementProbe>>;

    /// Full-page PNG screenshot
    async fn capture_png(&self) -> Result<Vec<u8>>;
}

/// Operations a recording session needs from the page the user is driving
#[async_trait]
pub trait RecordingTarget: Send + Sync {
    async fn current_url(&self) -> Result<String>;

    async fn viewport(&self) -> Result<Option<Viewport>>;

    /// Inject visibility and mutation watching into the current document
    async fn install_observer(&self) -> Result<()>;
}
