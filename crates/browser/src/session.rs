use super::launcher::{BrowserLauncher, version_url};
use anyhow::{Result, anyhow};
use chromiumoxide::browser::Browser;
use chromiumoxide::handler::Handler;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use rollcall_core::config::AppConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// DevTools endpoint of a browser started by a previous run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub cdp_port: u16,
    pub cdp_url: String,
}

/// A connected browser plus the task pumping its protocol events.
pub struct BrowserSession {
    pub browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    fn spawn(browser: Browser, handler: Handler) -> Self {
        Self { browser, handler: pump(handler) }
    }

    pub async fn open_page(&self, url: &str) -> Result<Page> {
        info!("Opening {}", url);
        self.browser.new_page(url).await.map_err(|e| anyhow!("Failed to open {}: {}", url, e))
    }

    /// Detaches from the browser and leaves it running for the next run.
    pub fn detach(self) {
        self.handler.abort();
    }
}

pub struct SessionManager {
    state_file: PathBuf,
    config: AppConfig,
}

impl SessionManager {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            state_file: rollcall_core::path_utils::session_file(),
            config: config.clone(),
        }
    }

    pub fn with_state_file(mut self, path: PathBuf) -> Self {
        self.state_file = path;
        self
    }

    pub fn load_session_state(&self) -> Option<SessionState> {
        let content = fs::read_to_string(&self.state_file).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn save_session_state(&self, state: &SessionState) -> Result<()> {
        if let Some(dir) = self.state_file.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.state_file, content)?;
        Ok(())
    }

    pub fn remove_session_state(&self) {
        let _ = fs::remove_file(&self.state_file);
    }

    pub async fn is_alive(&self, state: &SessionState) -> bool {
        let Ok(client) = reqwest::Client::builder().no_proxy().build() else {
            return false;
        };
        match client.get(version_url(state.cdp_port)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Reuses the recorded browser when it still answers, otherwise launches one.
    pub async fn connect(&self) -> Result<BrowserSession> {
        if let Some(state) = self.load_session_state() {
            if self.is_alive(&state).await {
                match Browser::connect(&state.cdp_url).await {
                    Ok((browser, handler)) => {
                        info!("Reusing browser on port {}", state.cdp_port);
                        return Ok(BrowserSession::spawn(browser, handler));
                    }
                    Err(e) => warn!("Recorded browser refused connection: {}", e),
                }
            }
            self.remove_session_state();
        }

        let launcher = BrowserLauncher::new(&self.config)?;
        let (_child, cdp_url) = launcher.launch_and_wait().await?;

        let state = SessionState { cdp_port: launcher.cdp_port, cdp_url: cdp_url.clone() };
        self.save_session_state(&state)?;

        let (browser, handler) = Browser::connect(&cdp_url)
            .await
            .map_err(|e| anyhow!("Failed to connect: {}", e))?;
        Ok(BrowserSession::spawn(browser, handler))
    }

    /// Closes the recorded browser. `false` when nothing was running.
    pub async fn stop(&self) -> Result<bool> {
        let Some(state) = self.load_session_state() else {
            return Ok(false);
        };
        if !self.is_alive(&state).await {
            self.remove_session_state();
            return Ok(false);
        }

        let (mut browser, handler) = Browser::connect(&state.cdp_url)
            .await
            .map_err(|e| anyhow!("Failed to connect: {}", e))?;
        let events = pump(handler);
        let closed = browser.close().await;
        events.abort();
        self.remove_session_state();

        closed.map_err(|e| anyhow!("Failed to close browser: {}", e))?;
        Ok(true)
    }
}

fn pump(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                error!("Browser handler error: {}", e);
                break;
            }
        }
    })
}
