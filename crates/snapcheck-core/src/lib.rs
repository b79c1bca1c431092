//! # snapcheck-core
//!
//! Capture and replay-verification engine for snapcheck, a content-regression
//! checker for web applications.
//!
//! A recording session observes the visible text content of every page a user
//! browses and stores it as a baseline. A replay session revisits each page
//! headlessly and checks the same content is still there and still visible.
//!
//! ## Pieces
//!
//! - [`visibility`]: is a rendered element visible content
//! - [`locator`]: stable element locators shared by record and replay
//! - [`probe`]: raw page-side element facts -> [`VisibleItem`]s
//! - [`recorder`]: incremental deduplicated recording state machine
//! - [`baseline`]: baseline persistence
//! - [`diff`]: baseline vs live comparison
//!
//! Nothing here touches a browser; see `snapcheck-browser` for that.

pub mod baseline;
pub mod config;
pub mod diff;
mod error;
pub mod fail_open;
pub mod locator;
pub mod probe;
pub mod recorder;
mod types;
pub mod visibility;

pub use baseline::BaselineStore;
pub use config::{Credentials, SnapcheckConfig};
pub use diff::{diff_page, PageFailure, Verdict};
pub use error::{ErrorKind, Result, SnapcheckError};
pub use locator::{ElementIdentity, LocatorSynthesizer, PathSegment};
pub use probe::{extract_live, ElementProbe, LiveExtraction};
pub use recorder::{Observation, RecorderState, SnapshotRecorder};
pub use types::*;
