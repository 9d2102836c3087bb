//! The engine's only window onto the live interface.
//!
//! Selector syntax is the implementor's business; the engine passes the
//! configured strings through untouched.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Opaque handle to a rendered element, issued by a [`UiQuery`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element(String);

impl Element {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn handle(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lookup or interaction that failed structurally. "Nothing matched" is
/// not an error; it is `Ok(None)` / an empty vec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UiError {
    #[error("element {0} is no longer attached")]
    Stale(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
}

pub type UiResult<T> = Result<T, UiError>;

#[async_trait]
pub trait UiQuery: Send + Sync {
    /// First match under `scope` (the whole document when `None`).
    async fn find(&self, scope: Option<&Element>, selector: &str) -> UiResult<Option<Element>>;

    async fn find_all(&self, scope: Option<&Element>, selector: &str) -> UiResult<Vec<Element>>;

    async fn is_displayed(&self, element: &Element) -> UiResult<bool>;

    /// Native-style click. `Ok(false)` when the click could not land
    /// (obstructed, zero-sized, rejected by the driver).
    async fn click(&self, element: &Element) -> UiResult<bool>;

    /// Programmatic click that bypasses hit-testing.
    async fn script_click(&self, element: &Element) -> UiResult<()>;

    /// Replaces the contents of an editable element. Empty text clears it.
    async fn type_text(&self, element: &Element, text: &str) -> UiResult<()>;

    async fn attribute(&self, element: &Element, name: &str) -> UiResult<Option<String>>;

    async fn text(&self, element: &Element) -> UiResult<String>;

    async fn scroll_to_bottom(&self, element: &Element) -> UiResult<()>;

    /// Scroll extent of a container; grows as lazy content materializes.
    async fn measure_extent(&self, element: &Element) -> UiResult<u64>;

    /// Returns the interface to its entry point.
    async fn reload(&self) -> UiResult<()>;

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(500)
    }

    /// Polls until a document-level match appears or `timeout` expires.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Option<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find(None, selector).await {
                Ok(Some(element)) => return Some(element),
                Ok(None) => {}
                Err(e) => debug!("wait_for({}) lookup error: {}", selector, e),
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(self.poll_interval()).await;
        }
    }

    /// Polls until a document-level match that is not among `known` appears.
    async fn wait_for_new(&self, selector: &str, known: &[Element], timeout: Duration) -> Option<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find_all(None, selector).await {
                Ok(elements) => {
                    if let Some(fresh) = elements.into_iter().find(|el| !known.contains(el)) {
                        return Some(fresh);
                    }
                }
                Err(e) => debug!("wait_for_new({}) lookup error: {}", selector, e),
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(self.poll_interval()).await;
        }
    }

    /// Polls until a match appears and is displayed.
    async fn wait_for_displayed(&self, selector: &str, timeout: Duration) -> Option<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(Some(element)) = self.find(None, selector).await {
                if self.is_displayed(&element).await.unwrap_or(false) {
                    return Some(element);
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(self.poll_interval()).await;
        }
    }

    /// Polls until no displayed match remains. `false` on timeout.
    async fn wait_for_absence(&self, selector: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.any_displayed(selector).await {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.poll_interval()).await;
        }
    }

    async fn any_displayed(&self, selector: &str) -> bool {
        let Ok(elements) = self.find_all(None, selector).await else {
            return false;
        };
        for element in &elements {
            if self.is_displayed(element).await.unwrap_or(false) {
                return true;
            }
        }
        false
    }
}
