//! Rollcall harvesting engine
//!
//! One pipeline per target: locate the entry, open its detail panel,
//! exhaust the lazily rendered member list, extract records. Every stage
//! reaches the live interface only through [`UiQuery`].

pub mod activate;
pub mod error;
pub mod exhaust;
pub mod extract;
pub mod locator;
pub mod orchestrator;
pub mod pacing;
pub mod panel;
pub mod record;
pub mod ui;

#[cfg(test)]
mod fake;

pub use activate::{ClickStrategy, SafeActivator};
pub use error::{HarvestError, Interaction};
pub use exhaust::{Exhaustion, ListExhauster};
pub use extract::RecordExtractor;
pub use locator::{CandidateEntry, LocateStrategy, TargetLocator};
pub use orchestrator::{Orchestrator, Outcome, TargetHarvest};
pub use pacing::{HumanPacer, NoPacing, Pacer, Pause};
pub use panel::{OpenStrategy, PanelOpener, PanelState};
pub use record::{HarvestResult, NOT_AVAILABLE, Record, TargetName};
pub use ui::{Element, UiError, UiQuery, UiResult};

use rollcall_core::config::{HarvestSettings, Limits, Selectors, Timeouts};

/// Everything a component needs, handed to each constructor explicitly.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
    pub ui: &'a dyn UiQuery,
    pub pacer: &'a dyn Pacer,
    pub settings: &'a HarvestSettings,
}

impl<'a> EngineContext<'a> {
    pub fn new(ui: &'a dyn UiQuery, pacer: &'a dyn Pacer, settings: &'a HarvestSettings) -> Self {
        Self { ui, pacer, settings }
    }

    pub fn selectors(&self) -> &'a Selectors {
        &self.settings.selectors
    }

    pub fn timeouts(&self) -> &'a Timeouts {
        &self.settings.timeouts
    }

    pub fn limits(&self) -> &'a Limits {
        &self.settings.limits
    }
}
