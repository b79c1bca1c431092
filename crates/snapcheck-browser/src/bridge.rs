//! Observation bridge: browser callbacks -> one ordered event stream
//!
//! Binding calls from the injected observer and frame navigations arrive on
//! the CDP transport thread. They are forwarded into a single unbounded
//! channel; the recording session is the only consumer, so every mutation of
//! the in-progress page happens on one logical path. Shutdown triggers (Ctrl-C,
//! browser gone, explicit stop) go through the same channel.

use crate::browser::BrowserSession;
use crate::error::Result;
use crate::scripts::BINDING_NAME;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Runtime;
use headless_chrome::Browser;
use snapcheck_core::SnapcheckError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Why a recording session stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    BrowserClosed,
    Interrupted,
    Stopped,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BrowserClosed => write!(f, "browser closed"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Everything the recording session consumes
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// Raw JSON payload for one element that entered the viewport
    Element(String),
    /// A frame finished navigating
    Navigated { url: String, main_frame: bool },
    Shutdown(ShutdownReason),
}

/// Cloneable sender for shutdown triggers
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: UnboundedSender<BridgeEvent>,
}

impl ShutdownHandle {
    pub fn new(tx: UnboundedSender<BridgeEvent>) -> Self {
        Self { tx }
    }

    /// Ask the session to stop. Returns false if it already has.
    pub fn shutdown(&self, reason: ShutdownReason) -> bool {
        self.tx.send(BridgeEvent::Shutdown(reason)).is_ok()
    }

    pub fn stop(&self) -> bool {
        self.shutdown(ShutdownReason::Stopped)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create the single event channel for one recording session
pub fn event_channel() -> (UnboundedSender<BridgeEvent>, UnboundedReceiver<BridgeEvent>) {
    unbounded_channel()
}

/// Register the runtime binding and forward bridge traffic into `tx`.
///
/// The tab owns the listener from here on; it lives as long as the tab.
pub fn attach(session: &BrowserSession, tx: UnboundedSender<BridgeEvent>) -> Result<()> {
    let tab = session.tab();

    tab.call_method(Runtime::Enable(None))
        .map_err(|e| SnapcheckError::Bridge(format!("Failed to enable runtime domain: {}", e)))?;

    tab.call_method(Runtime::AddBinding {
        name: BINDING_NAME.to_string(),
        execution_context_id: None,
        execution_context_name: None,
    })
    .map_err(|e| SnapcheckError::Bridge(format!("Failed to add binding: {}", e)))?;

    tab.add_event_listener(Arc::new(move |event: &Event| {
        let forwarded = match event {
            Event::RuntimeBindingCalled(called) if called.params.name == BINDING_NAME => {
                Some(BridgeEvent::Element(called.params.payload.clone()))
            }
            Event::PageFrameNavigated(navigated) => Some(BridgeEvent::Navigated {
                url: navigated.params.frame.url.clone(),
                main_frame: navigated.params.frame.parent_id.is_none(),
            }),
            _ => None,
        };

        if let Some(event) = forwarded {
            // Receiver gone means the session already finished
            let _ = tx.send(event);
        }
    }))
    .map_err(|e| SnapcheckError::Bridge(format!("Failed to register listener: {}", e)))?;

    info!("Observation bridge attached (binding: {})", BINDING_NAME);
    Ok(())
}

/// Poll the browser and report `BrowserClosed` once it stops answering
pub fn watch_browser(browser: Browser, handle: ShutdownHandle, interval: Duration) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || loop {
        std::thread::sleep(interval);
        if handle.is_closed() {
            break;
        }
        if browser.get_version().is_err() {
            debug!("Browser stopped answering CDP calls");
            handle.shutdown(ShutdownReason::BrowserClosed);
            break;
        }
    })
}

/// Report `Interrupted` on Ctrl-C
pub fn watch_interrupt(handle: ShutdownHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received");
            handle.shutdown(ShutdownReason::Interrupted);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_handle_delivers_reason() {
        let (tx, mut rx) = event_channel();
        let handle = ShutdownHandle::new(tx);

        assert!(handle.shutdown(ShutdownReason::Interrupted));
        assert_eq!(
            rx.recv().await,
            Some(BridgeEvent::Shutdown(ShutdownReason::Interrupted))
        );
    }

    #[tokio::test]
    async fn test_shutdown_after_receiver_dropped() {
        let (tx, rx) = event_channel();
        let handle = ShutdownHandle::new(tx);
        drop(rx);

        assert!(handle.is_closed());
        assert!(!handle.stop());
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ShutdownReason::BrowserClosed.to_string(), "browser closed");
        assert_eq!(ShutdownReason::Stopped.to_string(), "stopped");
    }
}
