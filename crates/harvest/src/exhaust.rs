//! Scroll-exhaustion of a virtualized list.
//!
//! A single unchanged extent is not trusted: rendering can trail the scroll
//! by more than one pause. Stopping requires a second unchanged measurement
//! after a confirmatory re-scroll, and the whole loop is bounded.

use crate::pacing::Pause;
use crate::ui::{Element, UiResult};
use crate::EngineContext;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    /// Extent confirmed stable twice in a row.
    Stable { attempts: u32, extent: u64 },
    /// Attempt budget spent while content was still arriving.
    BudgetSpent { attempts: u32, extent: u64 },
    /// The container stopped answering; whatever rendered is kept.
    Interrupted { attempts: u32 },
}

impl Exhaustion {
    pub fn is_complete(&self) -> bool {
        matches!(self, Exhaustion::Stable { .. })
    }
}

pub struct ListExhauster<'a> {
    ctx: EngineContext<'a>,
}

impl<'a> ListExhauster<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        Self { ctx }
    }

    /// Materializes as much of `container` as the attempt budget allows.
    /// Only the rendered DOM changes; extraction reads it afterwards.
    pub async fn exhaust(&self, container: &Element) -> Exhaustion {
        let max_attempts = self.ctx.limits().max_scroll_attempts;
        let mut attempts = 0;

        let mut last = match self.ctx.ui.measure_extent(container).await {
            Ok(extent) => extent,
            Err(e) => {
                warn!("Cannot measure list {}: {}", container, e);
                return Exhaustion::Interrupted { attempts };
            }
        };

        while attempts < max_attempts {
            attempts += 1;

            let current = match self.scroll_and_measure(container, Pause::Scroll).await {
                Ok(extent) => extent,
                Err(e) => {
                    warn!("Scrolling interrupted after {} attempts: {}", attempts, e);
                    return Exhaustion::Interrupted { attempts };
                }
            };

            if current == last {
                debug!("Extent unchanged at {}, confirming...", current);
                self.ctx.pacer.pause(Pause::Confirm).await;
                let confirmed = match self.scroll_and_measure(container, Pause::Confirm).await {
                    Ok(extent) => extent,
                    Err(e) => {
                        warn!("Confirmatory scroll interrupted: {}", e);
                        return Exhaustion::Interrupted { attempts };
                    }
                };
                if confirmed == current {
                    info!("List exhausted after {} scroll attempts (extent {})", attempts, confirmed);
                    return Exhaustion::Stable { attempts, extent: confirmed };
                }
                last = confirmed;
            } else {
                last = current;
            }

            if attempts % 10 == 0 {
                info!("Scrolling... Attempt {}/{}", attempts, max_attempts);
            }
        }

        warn!("Scroll budget of {} attempts spent; keeping what has rendered", max_attempts);
        Exhaustion::BudgetSpent { attempts, extent: last }
    }

    async fn scroll_and_measure(&self, container: &Element, pause: Pause) -> UiResult<u64> {
        self.ctx.ui.scroll_to_bottom(container).await?;
        self.ctx.pacer.pause(pause).await;
        self.ctx.ui.measure_extent(container).await
    }
}
