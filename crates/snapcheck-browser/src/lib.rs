//! Browser automation for snapcheck
//!
//! This crate connects the snapcheck engine to Chrome/Chromium through the
//! Chrome DevTools Protocol.
//!
//! # Features
//!
//! - **Browser Management**: launch, viewport emulation, navigate with timeouts
//! - **Observation Bridge**: page-side visibility observers reporting back
//!   through a CDP runtime binding into one event channel
//! - **Recording Sessions**: drive a [`snapcheck_core::SnapshotRecorder`] from
//!   bridge events and persist the baseline once on shutdown
//! - **Screenshot Artifacts**: full-page PNGs with on-disk verification
//! - **Login**: form-based authenticated session provider
//!
//! # Example
//!
//! ```no_run
//! use snapcheck_browser::{bridge, BrowserConfig, BrowserSession, RecordingSession, ShutdownHandle};
//! use snapcheck_core::{BaselineStore, LocatorSynthesizer};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = BrowserSession::launch_with_config(BrowserConfig::for_recording()).await?;
//!     session.navigate_with_timeout("https://example.com", Duration::from_secs(60)).await?;
//!
//!     let (tx, rx) = bridge::event_channel();
//!     bridge::attach(&session, tx.clone())?;
//!     bridge::watch_browser(session.browser(), ShutdownHandle::new(tx), Duration::from_secs(1));
//!
//!     let store = BaselineStore::new("baseline/steps.json");
//!     let summary = RecordingSession::new(&session, store, LocatorSynthesizer::default())
//!         .run(rx)
//!         .await?;
//!     println!("Recorded {} pages", summary.pages);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Requirements
//!
//! - Chrome or Chromium browser installed

pub mod auth;
pub mod bridge;
pub mod browser;
pub mod error;
pub mod page;
pub mod recording;
pub mod screenshot;
pub mod scripts;

// Re-export commonly used types
pub use auth::LoginFlow;
pub use bridge::{BridgeEvent, ShutdownHandle, ShutdownReason};
pub use browser::{BrowserConfig, BrowserSession};
pub use error::{BrowserError, Result};
pub use page::{LivePage, RecordingTarget};
pub use recording::{RecordingSession, RecordingSummary};
pub use screenshot::ArtifactStore;
