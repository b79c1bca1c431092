//! Configuration management for snapcheck
//!
//! Project settings live in `.snapcheck/config.toml`; secrets and
//! environment-specific values (base URL, credentials) come from the process
//! environment, see [`Credentials::from_env`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::locator::DEFAULT_TEST_ATTRIBUTE;
use crate::{Result, SnapcheckError};

/// Project-level snapcheck configuration
///
/// Loaded from `.snapcheck/config.toml` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapcheckConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub browser: BrowserSettings,

    #[serde(default)]
    pub replay: ReplaySettings,

    #[serde(default)]
    pub locator: LocatorSettings,

    #[serde(default)]
    pub login: LoginSettings,

    #[serde(default)]
    pub notify: NotifySettings,
}

/// Where baseline, screenshots and report are written (relative to project root)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_baseline_path")]
    pub baseline: PathBuf,

    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    #[serde(default = "default_report_path")]
    pub report: PathBuf,
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Recording is manually driven, so it defaults to a visible window
    #[serde(default)]
    pub record_headless: bool,

    #[serde(default = "default_true")]
    pub replay_headless: bool,
}

/// Replay timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySettings {
    /// Wait after scrolling before extraction
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Wait before each screenshot
    #[serde(default = "default_settle_ms")]
    pub screenshot_settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorSettings {
    #[serde(default = "default_test_attribute")]
    pub test_attribute: String,
}

/// Login form selectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSettings {
    #[serde(default)]
    pub login_path: String,

    #[serde(default = "default_username_selector")]
    pub username_selector: String,

    #[serde(default = "default_password_selector")]
    pub password_selector: String,

    #[serde(default = "default_submit_selector")]
    pub submit_selector: String,

    #[serde(default)]
    pub success_selector: Option<String>,

    #[serde(default = "default_success_timeout_secs")]
    pub success_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifySettings {
    #[serde(default)]
    pub webhook_url: Option<String>,
}

// Default value providers
fn default_baseline_path() -> PathBuf {
    PathBuf::from("baseline/steps.json")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("snapcheck-artifacts")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("snapcheck-report.html")
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    800
}

fn default_navigation_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_settle_ms() -> u64 {
    500
}

fn default_test_attribute() -> String {
    DEFAULT_TEST_ATTRIBUTE.to_string()
}

fn default_username_selector() -> String {
    "#username".to_string()
}

fn default_password_selector() -> String {
    "#password".to_string()
}

fn default_submit_selector() -> String {
    "button[type=\"submit\"]".to_string()
}

fn default_success_timeout_secs() -> u64 {
    15
}

impl SnapcheckConfig {
    /// Load configuration from `.snapcheck/config.toml` or use defaults
    pub fn load_or_default(project_root: &Path) -> Result<Self> {
        let config_path = Self::config_path(project_root);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| {
                SnapcheckError::Configuration(format!(
                    "Failed to parse {}: {}",
                    config_path.display(),
                    e
                ))
            })
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `.snapcheck/config.toml`
    pub fn write_default(project_root: &Path) -> Result<PathBuf> {
        let config_path = Self::config_path(project_root);
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(&Self::default()).map_err(|e| {
            SnapcheckError::Configuration(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }

    pub fn config_path(project_root: &Path) -> PathBuf {
        project_root.join(".snapcheck").join("config.toml")
    }

    /// Resolve configured relative paths against the project root
    pub fn resolve_paths(mut self, project_root: &Path) -> Self {
        self.paths.baseline = project_root.join(&self.paths.baseline);
        self.paths.artifacts_dir = project_root.join(&self.paths.artifacts_dir);
        self.paths.report = project_root.join(&self.paths.report);
        self
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl ReplaySettings {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn screenshot_settle(&self) -> Duration {
        Duration::from_millis(self.screenshot_settle_ms)
    }
}

impl Default for SnapcheckConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            browser: BrowserSettings::default(),
            replay: ReplaySettings::default(),
            locator: LocatorSettings::default(),
            login: LoginSettings::default(),
            notify: NotifySettings::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline_path(),
            artifacts_dir: default_artifacts_dir(),
            report: default_report_path(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            record_headless: false,
            replay_headless: true,
        }
    }
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            screenshot_settle_ms: default_settle_ms(),
        }
    }
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            test_attribute: default_test_attribute(),
        }
    }
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            login_path: String::new(),
            username_selector: default_username_selector(),
            password_selector: default_password_selector(),
            submit_selector: default_submit_selector(),
            success_selector: None,
            success_timeout_secs: default_success_timeout_secs(),
        }
    }
}

/// Session credentials and target, read from the environment
#[derive(Clone)]
pub struct Credentials {
    pub base_url: String,
    pub login_path: Option<String>,
    pub username: String,
    pub password: String,
    /// Page to open once logged in
    pub start_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("login_path", &self.login_path)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("start_url", &self.start_url)
            .finish()
    }
}

impl Credentials {
    pub const BASE_URL: &'static str = "SNAPCHECK_BASE_URL";
    pub const LOGIN_PATH: &'static str = "SNAPCHECK_LOGIN_PATH";
    pub const USERNAME: &'static str = "SNAPCHECK_USERNAME";
    pub const PASSWORD: &'static str = "SNAPCHECK_PASSWORD";
    pub const START_URL: &'static str = "SNAPCHECK_START_URL";

    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup (environment, test fixtures)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get(Self::BASE_URL);
        let username = get(Self::USERNAME);
        let password = get(Self::PASSWORD);

        let missing: Vec<&str> = [
            (Self::BASE_URL, base_url.is_none()),
            (Self::USERNAME, username.is_none()),
            (Self::PASSWORD, password.is_none()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();

        match (base_url, username, password) {
            (Some(base_url), Some(username), Some(password)) => Ok(Self {
                base_url,
                login_path: get(Self::LOGIN_PATH),
                username,
                password,
                start_url: get(Self::START_URL),
            }),
            _ => Err(SnapcheckError::Configuration(format!(
                "Missing env vars: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Full login page URL; the environment overrides the configured path
    pub fn login_url(&self, settings: &LoginSettings) -> String {
        let path = self
            .login_path
            .as_deref()
            .unwrap_or(settings.login_path.as_str());
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
