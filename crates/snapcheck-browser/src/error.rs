//! Browser error types - re-exports the unified SnapcheckError from snapcheck-core
//!
//! Browser failures map onto the infrastructure variants:
//! - Browser(String) - launch, CDP, element lookup, script evaluation
//! - NavigationTimeout - a page did not finish loading in time
//! - ArtifactWrite - a screenshot did not land on disk
//! - Bridge(String) - observation bridge setup or payload problems
//!
//! Error messages should name the operation and the URL or selector involved.

pub use snapcheck_core::{Result, SnapcheckError};

pub type BrowserError = SnapcheckError;
