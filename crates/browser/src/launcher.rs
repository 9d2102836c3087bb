use anyhow::{Result, anyhow};
use rollcall_core::config::AppConfig;
use serde_json::Value;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserType {
    Chrome,
    Brave,
    Edge,
    Arc,
    Chromium,
}

impl BrowserType {
    pub const ALL: [BrowserType; 5] = [
        BrowserType::Chrome,
        BrowserType::Brave,
        BrowserType::Edge,
        BrowserType::Arc,
        BrowserType::Chromium,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BrowserType::Chrome => "Google Chrome",
            BrowserType::Brave => "Brave",
            BrowserType::Edge => "Microsoft Edge",
            BrowserType::Arc => "Arc",
            BrowserType::Chromium => "Chromium",
        }
    }

    /// Executable names tried on `PATH` when no known install location exists.
    fn binaries(&self) -> &'static [&'static str] {
        match self {
            BrowserType::Chrome => &["google-chrome", "google-chrome-stable", "chrome"],
            BrowserType::Brave => &["brave-browser", "brave"],
            BrowserType::Edge => &["microsoft-edge", "microsoft-edge-stable", "msedge"],
            BrowserType::Arc => &[],
            BrowserType::Chromium => &["chromium", "chromium-browser"],
        }
    }
}

impl FromStr for BrowserType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "google-chrome" => Ok(BrowserType::Chrome),
            "brave" | "brave-browser" => Ok(BrowserType::Brave),
            "edge" | "microsoft-edge" => Ok(BrowserType::Edge),
            "arc" => Ok(BrowserType::Arc),
            "chromium" => Ok(BrowserType::Chromium),
            _ => Err(anyhow!("Unknown browser type: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserInfo {
    pub browser_type: BrowserType,
    pub path: PathBuf,
    pub version: Option<String>,
}

impl BrowserInfo {
    pub fn new(browser_type: BrowserType, path: PathBuf) -> Self {
        Self { browser_type, path, version: None }
    }

    pub fn with_version(mut self) -> Self {
        self.version = self.detect_version();
        self
    }

    fn detect_version(&self) -> Option<String> {
        let output = Command::new(&self.path).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        parse_version(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Last whitespace-separated token of `--version` output.
fn parse_version(output: &str) -> Option<String> {
    output.split_whitespace().last().map(str::to_string)
}

pub fn discover_browser(preferred: Option<BrowserType>) -> Result<BrowserInfo> {
    tracing::info!("Discovering browser. Preference: {:?}", preferred);
    let browsers = discover_all_browsers();
    tracing::info!(
        "Found installed browsers: {:?}",
        browsers.iter().map(|b| b.browser_type).collect::<Vec<_>>()
    );

    if let Some(pref) = preferred {
        if let Some(info) = browsers.iter().find(|b| b.browser_type == pref) {
            tracing::info!("Selected preferred browser: {:?}", info.browser_type);
            return Ok(info.clone());
        }
        tracing::warn!("Preferred browser {:?} is not installed", pref);
    }

    let selected = browsers
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No supported Chromium-based browser found"))?;
    tracing::info!("Selecting browser: {:?}", selected.browser_type);
    Ok(selected)
}

pub fn discover_all_browsers() -> Vec<BrowserInfo> {
    let mut found = Vec::new();

    for browser_type in BrowserType::ALL {
        let known = known_locations(browser_type)
            .into_iter()
            .map(|path| PathBuf::from(shellexpand::tilde(&path).to_string()))
            .find(|p| p.exists());
        let located = known.or_else(|| {
            browser_type.binaries().iter().find_map(|bin| which::which(bin).ok())
        });

        if let Some(path) = located {
            found.push(BrowserInfo::new(browser_type, path).with_version());
        }
    }
    found
}

#[cfg(target_os = "macos")]
fn known_locations(browser_type: BrowserType) -> Vec<String> {
    let (bundle_id, app) = match browser_type {
        BrowserType::Chrome => ("com.google.Chrome", "Google Chrome"),
        BrowserType::Brave => ("com.brave.Browser", "Brave Browser"),
        BrowserType::Edge => ("com.microsoft.edgemac", "Microsoft Edge"),
        BrowserType::Arc => ("company.thebrowser.Browser", "Arc"),
        BrowserType::Chromium => ("org.chromium.Chromium", "Chromium"),
    };

    let mut paths = Vec::new();
    if let Some(p) = find_mdfind_browser(bundle_id, app) {
        paths.push(p.to_string_lossy().to_string());
    }
    paths.push(format!("/Applications/{app}.app/Contents/MacOS/{app}"));
    paths.push(format!("~/Applications/{app}.app/Contents/MacOS/{app}"));
    paths
}

#[cfg(target_os = "linux")]
fn known_locations(browser_type: BrowserType) -> Vec<String> {
    let paths: &[&str] = match browser_type {
        BrowserType::Chrome => &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/opt/google/chrome/google-chrome",
        ],
        BrowserType::Brave => &["/usr/bin/brave-browser", "/usr/bin/brave"],
        BrowserType::Edge => &["/usr/bin/microsoft-edge", "/usr/bin/microsoft-edge-stable"],
        BrowserType::Arc => &[],
        BrowserType::Chromium => &["/usr/bin/chromium", "/usr/bin/chromium-browser", "/snap/bin/chromium"],
    };
    paths.iter().map(|p| p.to_string()).collect()
}

#[cfg(target_os = "windows")]
fn known_locations(browser_type: BrowserType) -> Vec<String> {
    let suffix = match browser_type {
        BrowserType::Chrome => r"Google\Chrome\Application\chrome.exe",
        BrowserType::Brave => r"BraveSoftware\Brave-Browser\Application\brave.exe",
        BrowserType::Edge => r"Microsoft\Edge\Application\msedge.exe",
        BrowserType::Arc | BrowserType::Chromium => return Vec::new(),
    };
    ["ProgramFiles", "ProgramFiles(x86)", "LOCALAPPDATA"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|base| format!(r"{}\{}", base, suffix))
        .collect()
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn known_locations(_browser_type: BrowserType) -> Vec<String> {
    Vec::new()
}

/// Use macOS Spotlight (mdfind) to locate a browser by Bundle ID
#[cfg(target_os = "macos")]
fn find_mdfind_browser(bundle_id: &str, binary_name: &str) -> Option<PathBuf> {
    let output = Command::new("mdfind")
        .arg(format!("kMDItemCFBundleIdentifier == '{}'", bundle_id))
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let app_path = PathBuf::from(stdout.lines().next()?);
    let full_path = app_path.join("Contents/MacOS").join(binary_name);
    if full_path.exists() {
        tracing::debug!("mdfind resolved {} to {:?}", bundle_id, full_path);
        return Some(full_path);
    }
    None
}

pub struct BrowserLauncher {
    pub browser_info: BrowserInfo,
    pub user_data_dir: PathBuf,
    pub cdp_port: u16,
    pub headless: bool,
}

impl BrowserLauncher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let preferred = config.browser.as_deref().map(BrowserType::from_str).transpose()?;
        let browser_info = discover_browser(preferred)?;

        Ok(Self {
            browser_info,
            user_data_dir: config.profile_dir(),
            cdp_port: config.cdp_port,
            headless: config.headless,
        })
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.cdp_port),
            format!("--user-data-dir={}", self.user_data_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-infobars".to_string(),
            "--disable-notifications".to_string(),
            "--window-size=1920,1080".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args
    }

    pub fn launch(&self) -> Result<Child> {
        tracing::info!(
            "Launching {} with profile {:?}",
            self.browser_info.browser_type.name(),
            self.user_data_dir
        );
        std::fs::create_dir_all(&self.user_data_dir)?;

        Command::new(&self.browser_info.path)
            .args(self.args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))
    }

    /// Polls the DevTools endpoint until it reports a websocket URL.
    pub async fn wait_for_cdp(&self) -> Result<String> {
        let url = version_url(self.cdp_port);
        let client = reqwest::Client::builder().no_proxy().build()?;

        for _ in 0..20 {
            sleep(Duration::from_millis(500)).await;
            let Ok(resp) = client.get(&url).send().await else {
                continue;
            };
            if !resp.status().is_success() {
                continue;
            }
            let json: Value = resp.json().await?;
            if let Some(ws_url) = json.get("webSocketDebuggerUrl").and_then(|v| v.as_str()) {
                return Ok(ws_url.to_string());
            }
        }
        Err(anyhow!("Timeout waiting for the DevTools endpoint on port {}", self.cdp_port))
    }

    pub async fn launch_and_wait(&self) -> Result<(Child, String)> {
        let child = self.launch()?;
        let ws_url = self.wait_for_cdp().await?;
        Ok((child, ws_url))
    }
}

pub(crate) fn version_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/json/version", port)
}
