//! Authenticated session provider
//!
//! Launches a browser, signs in through the application's login form and
//! hands back a ready session. Credentials stay inside this module.

use crate::browser::{BrowserConfig, BrowserSession};
use crate::error::Result;
use snapcheck_core::config::LoginSettings;
use snapcheck_core::{Credentials, SnapcheckError};
use std::time::Duration;
use tracing::info;

/// Form-based login against the configured selectors
pub struct LoginFlow<'a> {
    settings: &'a LoginSettings,
    credentials: &'a Credentials,
    navigation_timeout: Duration,
}

impl<'a> LoginFlow<'a> {
    pub fn new(settings: &'a LoginSettings, credentials: &'a Credentials, navigation_timeout: Duration) -> Self {
        Self {
            settings,
            credentials,
            navigation_timeout,
        }
    }

    /// Launch a browser and sign in
    pub async fn launch(&self, config: BrowserConfig) -> Result<BrowserSession> {
        let session = BrowserSession::launch_with_config(config).await?;
        self.sign_in(&session).await?;
        Ok(session)
    }

    /// Sign in on an existing session
    pub async fn sign_in(&self, session: &BrowserSession) -> Result<()> {
        let login_url = self.credentials.login_url(self.settings);
        info!("Navigating to login page {}", login_url);
        session
            .navigate_with_timeout(&login_url, self.navigation_timeout)
            .await?;

        session
            .fill(&self.settings.username_selector, &self.credentials.username)
            .await?;
        session
            .fill(&self.settings.password_selector, &self.credentials.password)
            .await?;

        info!("Submitting login");
        session.click(&self.settings.submit_selector).await?;
        session.wait_until_navigated().await?;

        if let Some(selector) = &self.settings.success_selector {
            let timeout = Duration::from_secs(self.settings.success_timeout_secs);
            session
                .wait_for_element(selector, Some(timeout))
                .await
                .map_err(|_| {
                    SnapcheckError::Browser(format!(
                        "Login did not succeed: {} never appeared",
                        selector
                    ))
                })?;
        }

        if let Some(start_url) = &self.credentials.start_url {
            session
                .navigate_with_timeout(start_url, self.navigation_timeout)
                .await?;
        }

        info!("Login successful");
        Ok(())
    }
}
