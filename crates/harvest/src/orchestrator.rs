//! Batch driver: runs the per-target pipeline and isolates failures.

use crate::activate::SafeActivator;
use crate::error::{HarvestError, Interaction};
use crate::exhaust::{Exhaustion, ListExhauster};
use crate::extract::RecordExtractor;
use crate::locator::TargetLocator;
use crate::pacing::Pause;
use crate::panel::PanelOpener;
use crate::record::{HarvestResult, TargetName};
use crate::ui::Element;
use crate::EngineContext;
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Complete,
    /// Records were extracted, but the list may not have been fully rendered.
    Partial(Exhaustion),
    Failed(HarvestError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHarvest {
    pub target: TargetName,
    pub records: HarvestResult,
    /// Member count advertised by the detail panel, when readable.
    pub expected: Option<usize>,
    pub outcome: Outcome,
}

impl TargetHarvest {
    fn failed(target: TargetName, error: HarvestError) -> Self {
        Self { target, records: Vec::new(), expected: None, outcome: Outcome::Failed(error) }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    /// How many advertised members were not extracted.
    pub fn shortfall(&self) -> Option<usize> {
        self.expected
            .filter(|&expected| expected > self.records.len())
            .map(|expected| expected - self.records.len())
    }
}

pub struct Orchestrator<'a> {
    ctx: EngineContext<'a>,
    locator: TargetLocator<'a>,
    opener: PanelOpener<'a>,
    activator: SafeActivator<'a>,
    exhauster: ListExhauster<'a>,
    extractor: RecordExtractor<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        Self {
            ctx,
            locator: TargetLocator::new(ctx),
            opener: PanelOpener::new(ctx),
            activator: SafeActivator::new(ctx),
            exhauster: ListExhauster::new(ctx),
            extractor: RecordExtractor::new(ctx),
        }
    }

    /// One entry per distinct target, in input order. A failing target
    /// never stops the batch.
    pub async fn harvest(&self, targets: &[TargetName]) -> Vec<TargetHarvest> {
        let mut seen = HashSet::new();
        let mut harvests = Vec::with_capacity(targets.len());

        for target in targets {
            if !seen.insert(target.clone()) {
                info!("Skipping duplicate target '{}'", target);
                continue;
            }
            if !harvests.is_empty() {
                self.ctx.pacer.pause(Pause::BetweenTargets).await;
            }

            info!("🔍 Extracting contacts from group: {}", target);
            let harvest = match self.harvest_one(target).await {
                Ok(harvest) => harvest,
                Err(e) => {
                    warn!("❌ {}: {}", target, e);
                    TargetHarvest::failed(target.clone(), e)
                }
            };
            harvests.push(harvest);
        }

        let failed = harvests.iter().filter(|h| h.is_failed()).count();
        info!("Batch finished: {} targets, {} failed", harvests.len(), failed);
        harvests
    }

    pub async fn harvest_one(&self, target: &TargetName) -> Result<TargetHarvest, HarvestError> {
        self.reset().await;
        self.await_ready().await?;
        self.ctx.pacer.pause(Pause::Settle).await;

        self.locator.locate(target).await?;
        self.ctx.pacer.pause(Pause::Settle).await;

        if !self.opener.open().await {
            return Err(HarvestError::InteractionFailed(Interaction::DetailPanel));
        }

        let expected = self.expected_count().await;
        let list = self.open_list().await?;
        let exhaustion = self.exhauster.exhaust(&list).await;
        let unreadable = HarvestError::InteractionFailed(Interaction::MemberRows);
        let records = match self.extractor.try_extract_all(&list).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Member list of '{}' could not be read: {}", target, e);
                return Err(unreadable);
            }
        };
        if records.is_empty() && matches!(exhaustion, Exhaustion::Interrupted { .. }) {
            return Err(unreadable);
        }

        if let Some(expected) = expected {
            if records.len() < expected {
                warn!(
                    "'{}' advertises {} members but {} were extracted",
                    target,
                    expected,
                    records.len()
                );
            }
        }

        let outcome = if exhaustion.is_complete() {
            Outcome::Complete
        } else {
            Outcome::Partial(exhaustion)
        };
        Ok(TargetHarvest { target: target.clone(), records, expected, outcome })
    }

    /// Leaves whatever the previous target opened.
    async fn reset(&self) {
        if let Err(e) = self.ctx.ui.reload().await {
            warn!("Reload failed, continuing from the current view: {}", e);
        }
    }

    async fn await_ready(&self) -> Result<(), HarvestError> {
        info!("Waiting for the interface to load (scan the QR code if not logged in)...");
        let timeout = self.ctx.timeouts().ready();
        match self.ctx.ui.wait_for(&self.ctx.selectors().ready, timeout).await {
            Some(_) => Ok(()),
            None => Err(HarvestError::InteractionFailed(Interaction::Ready)),
        }
    }

    async fn expected_count(&self) -> Option<usize> {
        let selector = &self.ctx.selectors().member_count;
        let element = self.ctx.ui.wait_for(selector, self.ctx.timeouts().panel_check()).await?;
        let label = match self.ctx.ui.attribute(&element, "aria-label").await {
            Ok(label) => label?,
            Err(e) => {
                debug!("Member count unreadable: {}", e);
                return None;
            }
        };

        let count = parse_member_count(&label);
        match count {
            Some(count) => info!("Total members in group: {}", count),
            None => debug!("Unrecognized member count label '{}'", label),
        }
        count
    }

    /// Switches the panel to its full member list and returns the list container.
    async fn open_list(&self) -> Result<Element, HarvestError> {
        let selectors = self.ctx.selectors();
        let timeout = self.ctx.timeouts().element();
        let failed = HarvestError::InteractionFailed(Interaction::ListView);

        let Some(view_all) = self.ctx.ui.wait_for(&selectors.view_all, timeout).await else {
            return Err(failed);
        };
        // The panel may already render a preview list matching the same selector.
        let previews = self.ctx.ui.find_all(None, &selectors.member_list).await.unwrap_or_default();

        info!("Opening the full member list...");
        if !self.activator.activate(&view_all).await {
            return Err(failed);
        }
        self.ctx.pacer.pause(Pause::Action).await;

        self.ctx
            .ui
            .wait_for_new(&selectors.member_list, &previews, timeout)
            .await
            .ok_or(failed)
    }
}

/// First token of a label like `"1,024 members"`, separators removed.
pub fn parse_member_count(label: &str) -> Option<usize> {
    let token = label.split_whitespace().next()?;
    token.replace([',', '.'], "").parse().ok()
}
