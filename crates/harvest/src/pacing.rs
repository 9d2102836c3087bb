//! Human-scale throttling between interactions.
//!
//! Pauses only bound the request rate. Every stop condition in the engine
//! is a structural observation, so swapping in [`NoPacing`] never changes
//! what gets harvested.

use async_trait::async_trait;
use rand::Rng;
use rollcall_core::config::{DelayRange, PacingSettings};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After a click or keystroke burst.
    Action,
    /// After each scroll of a lazy list.
    Scroll,
    /// The longer pause around a confirmatory re-scroll.
    Confirm,
    /// Letting a freshly opened view render.
    Settle,
    BetweenTargets,
}

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, pause: Pause);
}

/// Sleeps for a uniformly random duration within the configured range.
pub struct HumanPacer {
    settings: PacingSettings,
}

impl HumanPacer {
    pub fn new(settings: PacingSettings) -> Self {
        Self { settings }
    }

    fn range(&self, pause: Pause) -> DelayRange {
        match pause {
            Pause::Action => self.settings.action,
            Pause::Scroll => self.settings.scroll,
            Pause::Confirm => self.settings.confirm,
            Pause::Settle => self.settings.settle,
            Pause::BetweenTargets => self.settings.between_targets,
        }
    }

    pub fn duration(&self, pause: Pause) -> Duration {
        let (low, high) = self.range(pause).bounds();
        let ms = if low == high { low } else { rand::thread_rng().gen_range(low..=high) };
        Duration::from_millis(ms)
    }
}

#[async_trait]
impl Pacer for HumanPacer {
    async fn pause(&self, pause: Pause) {
        let delay = self.duration(pause);
        debug!("Pacing {:?} for {:?}", pause, delay);
        tokio::time::sleep(delay).await;
    }
}

/// Pacing disabled.
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn pause(&self, _pause: Pause) {}
}
