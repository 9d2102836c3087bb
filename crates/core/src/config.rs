use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URL: &str = "https://web.whatsapp.com";
pub const DEFAULT_CDP_PORT: u16 = 9222;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Entry point of the interface being harvested.
    pub url: String,

    /// Preferred browser name (chrome, brave, edge, arc, chromium).
    #[serde(default)]
    pub browser: Option<String>,

    pub headless: bool,

    pub cdp_port: u16,

    /// Persistent browser profile; keeps the interface logged in between runs.
    #[serde(default)]
    pub profile_dir: Option<String>,

    #[serde(default)]
    pub harvest: HarvestSettings,

    #[serde(default)]
    pub pacing: PacingSettings,
}

impl AppConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        // 1. Try standard dotenv discovery from current dir
        if dotenvy::dotenv().is_err() {
            // 2. Fallback: the app root
            let path = crate::path_utils::get_app_root().join(".env");
            if path.exists() {
                let _ = dotenvy::from_path(&path);
            }
        }

        let mut builder = Self::defaults()?.add_source(File::with_name("rollcall").required(false));
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("ROLLCALL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Defaults plus a single file, without touching the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("url", DEFAULT_URL)?
            .set_default("headless", false)?
            .set_default("cdp_port", i64::from(DEFAULT_CDP_PORT))
    }

    pub fn profile_dir(&self) -> PathBuf {
        match &self.profile_dir {
            Some(dir) => crate::path_utils::ensure_absolute(dir),
            None => crate::path_utils::get_app_root().join("chrome_profile"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            browser: None,
            headless: false,
            cdp_port: DEFAULT_CDP_PORT,
            profile_dir: None,
            harvest: HarvestSettings::default(),
            pacing: PacingSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HarvestSettings {
    pub timeouts: Timeouts,
    pub limits: Limits,
    pub selectors: Selectors,
}

/// Bounds for condition waits. Expiry is a typed failure, never a crash.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Timeouts {
    /// Baseline readiness; long because it may wait on a QR-code login.
    pub ready_secs: u64,
    pub element_secs: u64,
    pub panel_check_secs: u64,
    pub overlay_secs: u64,
    pub poll_interval_ms: u64,
}

impl Timeouts {
    pub fn ready(&self) -> Duration {
        Duration::from_secs(self.ready_secs)
    }

    pub fn element(&self) -> Duration {
        Duration::from_secs(self.element_secs)
    }

    pub fn panel_check(&self) -> Duration {
        Duration::from_secs(self.panel_check_secs)
    }

    pub fn overlay(&self) -> Duration {
        Duration::from_secs(self.overlay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ready_secs: 300,
            element_secs: 20,
            panel_check_secs: 3,
            overlay_secs: 10,
            poll_interval_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Limits {
    pub panel_attempts: u32,
    pub max_scroll_attempts: u32,
    pub row_progress_every: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            panel_attempts: 3,
            max_scroll_attempts: 50,
            row_progress_every: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Ordered `(low, high)` bounds, tolerant of swapped values in a config file.
    pub fn bounds(&self) -> (u64, u64) {
        if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        }
    }
}

/// Human-scale throttle between interactions. Never load-bearing for a stop condition.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PacingSettings {
    pub action: DelayRange,
    pub scroll: DelayRange,
    pub confirm: DelayRange,
    pub settle: DelayRange,
    pub between_targets: DelayRange,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            action: DelayRange::new(2000, 3000),
            scroll: DelayRange::new(1000, 2000),
            confirm: DelayRange::new(2000, 3000),
            settle: DelayRange::new(3000, 5000),
            between_targets: DelayRange::new(2000, 4000),
        }
    }
}

/// Every lookup the engine performs. CSS by default; a selector starting
/// with `/`, `./` or `(` is evaluated as XPath.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Selectors {
    pub ready: String,
    pub search_box: String,
    pub search_result: String,
    pub sidebar_row: String,
    pub row_title: String,
    pub conversation: String,
    pub overlay: String,
    pub panel_marker: String,
    pub title_region: String,
    pub header_container: String,
    pub details_button: String,
    pub member_count: String,
    pub view_all: String,
    pub member_list: String,
    pub member_row: String,
    pub member_name: String,
    pub phone_slot: String,
    pub phone_title: String,
    pub role_badge: String,
    /// Text whose presence in a row marks a group admin.
    pub role_marker: String,
    /// Decoration prefixed to names of unsaved contacts.
    pub name_decoration: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            ready: r#"div[role="listitem"]"#.into(),
            search_box: r#"div[contenteditable="true"][data-tab="3"]"#.into(),
            search_result: r#"div[role="listitem"]"#.into(),
            sidebar_row: r#"div[role="listitem"]"#.into(),
            row_title: "span[title]".into(),
            conversation: "#main".into(),
            overlay: r#"div[role="dialog"]"#.into(),
            panel_marker: r#"//div[contains(text(), "View all")]"#.into(),
            title_region: r#"//span[@dir="auto" and contains(@class, "x1iyjqo2")]"#.into(),
            header_container: r#"div[data-testid="conversation-header"]"#.into(),
            details_button: r#"div[title="Profile details"][role="button"]"#.into(),
            member_count: r#"div[aria-label*="members"]"#.into(),
            view_all: r#"//div[contains(text(), "View all")]"#.into(),
            member_list: r#"div[role="list"]"#.into(),
            member_row: r#"div[role="listitem"]"#.into(),
            member_name: "span[aria-label]".into(),
            phone_slot: "span._ajzr span".into(),
            phone_title: r#"span[title*="+"]"#.into(),
            role_badge: "span".into(),
            role_marker: "admin".into(),
            name_decoration: "Maybe ".into(),
        }
    }
}
