//! Browser lifecycle management using Chrome DevTools Protocol

use crate::error::Result;
use crate::page::{LivePage, RecordingTarget};
use crate::scripts::{self, PageScripts};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use headless_chrome::protocol::cdp::{Emulation, Page, DOM};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::de::DeserializeOwned;
use snapcheck_core::locator::DEFAULT_TEST_ATTRIBUTE;
use snapcheck_core::{ElementProbe, SnapcheckError, Viewport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for browser launch
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode (default: true)
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Default wait for elements, in seconds
    pub timeout_seconds: u64,
    /// How long the browser may go without CDP traffic before it is torn down.
    /// Manual recording sessions need this to be long.
    pub idle_timeout: Duration,
    /// Attribute reported to the locator synthesizer
    pub test_attribute: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 800,
            timeout_seconds: 30,
            idle_timeout: Duration::from_secs(30),
            test_attribute: DEFAULT_TEST_ATTRIBUTE.to_string(),
        }
    }
}

impl BrowserConfig {
    /// Headed browser for a manually driven recording session
    pub fn for_recording() -> Self {
        Self {
            headless: false,
            idle_timeout: Duration::from_secs(60 * 60 * 12),
            ..Self::default()
        }
    }
}

/// Active browser session with Chrome DevTools Protocol
///
/// Owns the browser for its whole lifetime; dropping the session releases it.
pub struct BrowserSession {
    browser: Browser,
    /// Current active tab
    tab: Arc<Tab>,
    /// Configuration
    config: BrowserConfig,
    scripts: PageScripts,
}

impl BrowserSession {
    /// Launch browser with custom configuration
    pub async fn launch_with_config(config: BrowserConfig) -> Result<Self> {
        info!(
            "Launching browser (headless: {}, size: {}x{})",
            config.headless, config.window_width, config.window_height
        );

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(config.idle_timeout)
            .build()
            .map_err(|e| SnapcheckError::Browser(format!("Failed to launch browser: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| SnapcheckError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| SnapcheckError::Browser(format!("Failed to create tab: {}", e)))?;

        info!("Browser launched successfully");

        Ok(Self::from_parts(browser, tab, config))
    }

    fn from_parts(browser: Browser, tab: Arc<Tab>, config: BrowserConfig) -> Self {
        let scripts = PageScripts::new(config.test_attribute.clone());
        Self {
            browser,
            tab,
            config,
            scripts,
        }
    }

    /// Navigate to a URL, failing with `NavigationTimeout` if the load does not
    /// complete within `timeout`
    pub async fn navigate_with_timeout(&self, url: &str, timeout: Duration) -> Result<()> {
        debug!("Navigating to {} (timeout: {:?})", url, timeout);

        self.tab.set_default_timeout(timeout);

        let outcome = self
            .tab
            .navigate_to(url)
            .map_err(|e| SnapcheckError::Browser(format!("Failed to navigate to {}: {}", url, e)))
            .and_then(|tab| {
                tab.wait_until_navigated().map_err(|_| SnapcheckError::NavigationTimeout {
                    url: url.to_string(),
                    timeout,
                })
            });

        self.tab
            .set_default_timeout(Duration::from_secs(self.config.timeout_seconds));
        outcome?;

        info!("Successfully navigated to {}", url);
        Ok(())
    }

    /// Wait for an element to appear
    ///
    /// # Arguments
    /// * `selector` - CSS selector for the element
    /// * `timeout` - Optional timeout duration (uses config default if None)
    pub async fn wait_for_element(&self, selector: &str, timeout: Option<Duration>) -> Result<()> {
        let timeout_duration = timeout.unwrap_or_else(|| Duration::from_secs(self.config.timeout_seconds));

        debug!("Waiting for element: {} (timeout: {:?})", selector, timeout_duration);

        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout_duration)
            .map_err(|_e| SnapcheckError::Browser(format!("Element not found: {}", selector)))?;

        debug!("Element found: {}", selector);
        Ok(())
    }

    /// Type text into the element matching `selector`
    pub async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        debug!("Filling {}", selector);

        let element = self
            .tab
            .wait_for_element(selector)
            .map_err(|_e| SnapcheckError::Browser(format!("Element not found: {}", selector)))?;
        element
            .click()
            .map_err(|e| SnapcheckError::Browser(format!("Failed to focus {}: {}", selector, e)))?;
        element
            .type_into(text)
            .map_err(|e| SnapcheckError::Browser(format!("Failed to fill {}: {}", selector, e)))?;
        Ok(())
    }

    /// Click the element matching `selector`
    pub async fn click(&self, selector: &str) -> Result<()> {
        debug!("Clicking {}", selector);

        let element = self
            .tab
            .wait_for_element(selector)
            .map_err(|_e| SnapcheckError::Browser(format!("Element not found: {}", selector)))?;
        element
            .click()
            .map_err(|e| SnapcheckError::Browser(format!("Failed to click {}: {}", selector, e)))?;
        Ok(())
    }

    /// Wait for a navigation triggered by a page action (form submit, link click)
    pub async fn wait_until_navigated(&self) -> Result<()> {
        self.tab
            .wait_until_navigated()
            .map_err(|e| SnapcheckError::Browser(format!("Navigation did not complete: {}", e)))?;
        Ok(())
    }

    /// Execute JavaScript in the page context
    ///
    /// # Returns
    /// JSON result from JavaScript execution
    pub async fn evaluate_script(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| SnapcheckError::Browser(format!("JavaScript evaluation failed: {}", e)))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    /// Evaluate a script that returns a JSON string and decode it
    async fn evaluate_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let value = self.evaluate_script(script).await?;
        let raw = value.as_str().ok_or_else(|| {
            SnapcheckError::Browser(format!("Expected a JSON string from page, got {}", value))
        })?;
        Ok(serde_json::from_str(raw)?)
    }

    /// Get the current URL
    pub async fn get_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    /// Handle on the underlying browser, for liveness watching
    pub fn browser(&self) -> Browser {
        self.browser.clone()
    }

    /// Get reference to the active tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Close the browser session
    pub async fn close(self) -> Result<()> {
        info!("Closing browser session");
        // Browser process is killed when the last handle drops
        Ok(())
    }
}

#[async_trait]
impl LivePage for BrowserSession {
    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        debug!("Setting viewport to {}x{}", viewport.width, viewport.height);

        self.tab
            .call_method(device_metrics(viewport))
            .map_err(|e| SnapcheckError::Browser(format!("Failed to set viewport: {}", e)))?;
        Ok(())
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        self.navigate_with_timeout(url, timeout).await
    }

    async fn scroll_to(&self, y: f64) -> Result<()> {
        self.evaluate_script(&scripts::scroll_to(y)).await?;
        Ok(())
    }

    async fn probe_document(&self) -> Result<Vec<ElementProbe>> {
        let probes: Vec<ElementProbe> = self.evaluate_json(&self.scripts.extraction()).await?;
        debug!("Probed {} elements", probes.len());
        Ok(probes)
    }

    async fn capture_png(&self) -> Result<Vec<u8>> {
        let metrics = self
            .tab
            .call_method(Page::GetLayoutMetrics(None))
            .map_err(|e| SnapcheckError::Browser(format!("Failed to read layout metrics: {}", e)))?;
        let clip = full_page_clip(&metrics.css_content_size);
        debug!("Capturing {}x{} page", clip.width, clip.height);

        let shot = self
            .tab
            .call_method(Page::CaptureScreenshot {
                format: Some(Page::CaptureScreenshotFormatOption::Png),
                quality: None,
                clip: Some(clip),
                from_surface: Some(true),
                capture_beyond_viewport: Some(true),
                optimize_for_speed: None,
            })
            .map_err(|e| SnapcheckError::Browser(format!("CDP capture failed: {}", e)))?;
        decode_png(&shot.data)
    }
}

#[async_trait]
impl RecordingTarget for BrowserSession {
    async fn current_url(&self) -> Result<String> {
        self.get_url().await
    }

    async fn viewport(&self) -> Result<Option<Viewport>> {
        let viewport: Viewport = self.evaluate_json(scripts::VIEWPORT_QUERY).await?;
        Ok(Some(viewport))
    }

    async fn install_observer(&self) -> Result<()> {
        let installed = self.evaluate_script(&self.scripts.observer()).await?;
        debug!("Observer install result: {}", installed);
        Ok(())
    }
}

/// Emulated viewport matching the recorded `innerWidth` x `innerHeight`
fn device_metrics(viewport: Viewport) -> Emulation::SetDeviceMetricsOverride {
    Emulation::SetDeviceMetricsOverride {
        width: viewport.width,
        height: viewport.height,
        // 0 keeps the browser's own pixel ratio
        device_scale_factor: 0.0,
        mobile: false,
        scale: None,
        screen_width: None,
        screen_height: None,
        position_x: None,
        position_y: None,
        dont_set_visible_size: None,
        screen_orientation: None,
        viewport: None,
        display_feature: None,
        device_posture: None,
    }
}

/// Clip covering the whole document, not just the visible viewport
fn full_page_clip(content: &DOM::Rect) -> Page::Viewport {
    Page::Viewport {
        x: 0.0,
        y: 0.0,
        width: content.width.ceil().max(1.0),
        height: content.height.ceil().max(1.0),
        scale: 1.0,
    }
}

fn decode_png(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data)
        .map_err(|e| SnapcheckError::Browser(format!("Screenshot was not valid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_is_emulated_exactly() {
        let metrics = device_metrics(Viewport::new(1366, 768));
        assert_eq!((metrics.width, metrics.height), (1366, 768));
        assert!(!metrics.mobile);
        assert_eq!(metrics.device_scale_factor, 0.0);
    }

    #[test]
    fn test_clip_covers_content_below_the_fold() {
        let content = DOM::Rect {
            x: 0.0,
            y: 0.0,
            width: 1280.0,
            height: 4210.4,
        };
        let clip = full_page_clip(&content);
        assert_eq!((clip.x, clip.y), (0.0, 0.0));
        assert_eq!(clip.width, 1280.0);
        assert_eq!(clip.height, 4211.0);
        assert_eq!(clip.scale, 1.0);
    }

    #[test]
    fn test_clip_of_empty_document_is_not_zero() {
        let empty = DOM::Rect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        };
        let clip = full_page_clip(&empty);
        assert_eq!((clip.width, clip.height), (1.0, 1.0));
    }

    #[test]
    fn test_decode_png() {
        assert_eq!(decode_png("iVBORw==").unwrap(), b"\x89PNG".to_vec());
        assert!(matches!(decode_png("not base64!"), Err(SnapcheckError::Browser(_))));
    }

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.window_height, 800);
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.test_attribute, "data-testid");
    }

    #[test]
    fn test_recording_config() {
        let config = BrowserConfig::for_recording();
        assert!(!config.headless);
        assert!(config.idle_timeout >= Duration::from_secs(3600));
        assert_eq!(config.window_width, 1280);
    }
}
