//! Chromium backend for the harvesting engine
//!
//! Finds or launches a Chromium-family browser with a persistent profile,
//! keeps its DevTools endpoint for reuse across runs, and exposes a tab
//! through [`rollcall_harvest::UiQuery`].

pub mod launcher;
pub mod page;
pub mod scripts;
pub mod session;

pub use launcher::{BrowserInfo, BrowserLauncher, BrowserType, discover_all_browsers, discover_browser};
pub use page::ChromiumUi;
pub use session::{BrowserSession, SessionManager, SessionState};
