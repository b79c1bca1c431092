//! # snapcheck-replay
//!
//! Replay side of snapcheck: revisit every baseline page on a live browser
//! page, judge it, and report.
//!
//! - [`ReplayVerifier`]: sequential per-page verification
//! - [`ReportBuilder`]: self-contained HTML report with inlined screenshots
//! - [`Notifier`]: optional failure notifications, always fail-open

pub mod notify;
pub mod report;
pub mod verifier;

pub use notify::{FailureSummary, NoopNotifier, Notifier, WebhookNotifier};
pub use report::ReportBuilder;
pub use verifier::{ReplayConfig, ReplayRun, ReplayVerifier};
