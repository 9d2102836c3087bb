//! Drives the open conversation to its detail panel.
//!
//! No single affordance opens the panel reliably across interface states,
//! so several are tried in order. Success is only ever read from the panel
//! marker, never from a click that did not complain.

use crate::activate::SafeActivator;
use crate::pacing::Pause;
use crate::EngineContext;
use rollcall_core::config::Selectors;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenStrategy {
    TitleRegion,
    HeaderContainer,
    DetailsButton,
}

impl OpenStrategy {
    pub const ORDER: [OpenStrategy; 3] = [
        OpenStrategy::TitleRegion,
        OpenStrategy::HeaderContainer,
        OpenStrategy::DetailsButton,
    ];

    pub fn selector(self, selectors: &Selectors) -> &str {
        match self {
            OpenStrategy::TitleRegion => &selectors.title_region,
            OpenStrategy::HeaderContainer => &selectors.header_container,
            OpenStrategy::DetailsButton => &selectors.details_button,
        }
    }
}

pub struct PanelOpener<'a> {
    ctx: EngineContext<'a>,
    activator: SafeActivator<'a>,
}

impl<'a> PanelOpener<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        Self { ctx, activator: SafeActivator::new(ctx) }
    }

    /// Observed from the panel marker, bounded by the short panel-check wait.
    pub async fn state(&self) -> PanelState {
        let marker = &self.ctx.selectors().panel_marker;
        match self.ctx.ui.wait_for_displayed(marker, self.ctx.timeouts().panel_check()).await {
            Some(_) => PanelState::Open,
            None => PanelState::Closed,
        }
    }

    /// Idempotent: an already open panel returns `true` without interacting.
    pub async fn open(&self) -> bool {
        if self.state().await == PanelState::Open {
            info!("Detail panel is already open");
            return true;
        }

        let attempts = self.ctx.limits().panel_attempts.max(1);
        for attempt in 1..=attempts {
            info!("Attempt {}/{} to open the detail panel...", attempt, attempts);

            for strategy in OpenStrategy::ORDER {
                if self.try_strategy(strategy).await {
                    info!("Detail panel opened via {:?}", strategy);
                    return true;
                }
            }

            warn!("All panel strategies failed on attempt {}", attempt);
            self.ctx.pacer.pause(Pause::Action).await;
        }
        false
    }

    pub async fn try_strategy(&self, strategy: OpenStrategy) -> bool {
        let selector = strategy.selector(self.ctx.selectors());
        let element = match self.ctx.ui.find(None, selector).await {
            Ok(Some(element)) => element,
            Ok(None) => {
                debug!("{:?}: nothing matches {}", strategy, selector);
                return false;
            }
            Err(e) => {
                debug!("{:?}: lookup failed: {}", strategy, e);
                return false;
            }
        };

        if !self.activator.activate(&element).await {
            return false;
        }
        self.ctx.pacer.pause(Pause::Action).await;
        self.state().await == PanelState::Open
    }
}
