//! Layered click: wait out overlays, try a native click, fall back to a
//! scripted one. Shared by the locator, the panel opener and list navigation.

use crate::EngineContext;
use crate::ui::Element;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickStrategy {
    Native,
    Scripted,
}

impl ClickStrategy {
    pub const ORDER: [ClickStrategy; 2] = [ClickStrategy::Native, ClickStrategy::Scripted];
}

pub struct SafeActivator<'a> {
    ctx: EngineContext<'a>,
}

impl<'a> SafeActivator<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        Self { ctx }
    }

    /// Never errors: any failure inside is reported as `false`.
    pub async fn activate(&self, element: &Element) -> bool {
        self.wait_out_overlay().await;

        for strategy in ClickStrategy::ORDER {
            if self.click_with(strategy, element).await {
                debug!("Activated {} via {:?} click", element, strategy);
                return true;
            }
        }
        warn!("Every click strategy failed for {}", element);
        false
    }

    /// `true` once no blocking overlay is displayed. A stuck overlay is
    /// reported but not fatal; the scripted click does not hit-test.
    pub async fn wait_out_overlay(&self) -> bool {
        let selector = &self.ctx.selectors().overlay;
        if !self.ctx.ui.any_displayed(selector).await {
            return true;
        }

        info!("Waiting for overlay to disappear...");
        let timeout = self.ctx.timeouts().overlay();
        let cleared = self.ctx.ui.wait_for_absence(selector, timeout).await;
        if !cleared {
            warn!("Overlay still displayed after {:?}", timeout);
        }
        cleared
    }

    pub async fn click_with(&self, strategy: ClickStrategy, element: &Element) -> bool {
        match strategy {
            ClickStrategy::Native => match self.ctx.ui.click(element).await {
                Ok(true) => true,
                Ok(false) => {
                    debug!("Regular click did not land on {}, trying scripted click...", element);
                    false
                }
                Err(e) => {
                    debug!("Regular click on {} failed: {}", element, e);
                    false
                }
            },
            ClickStrategy::Scripted => match self.ctx.ui.script_click(element).await {
                Ok(()) => true,
                Err(e) => {
                    debug!("Scripted click on {} failed: {}", element, e);
                    false
                }
            },
        }
    }
}
