//! Resolves a target name to an entry in the interface and opens it.
//!
//! Active search goes first because it is fast; the passive sidebar scan
//! covers a lagging search index. Both accept only an exact label match.

use crate::activate::SafeActivator;
use crate::error::{HarvestError, Interaction};
use crate::pacing::Pause;
use crate::record::TargetName;
use crate::ui::Element;
use crate::EngineContext;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    Search,
    SidebarScan,
}

impl LocateStrategy {
    pub const ORDER: [LocateStrategy; 2] = [LocateStrategy::Search, LocateStrategy::SidebarScan];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    pub label: String,
    pub element: Element,
    pub via: LocateStrategy,
}

pub struct TargetLocator<'a> {
    ctx: EngineContext<'a>,
    activator: SafeActivator<'a>,
}

impl<'a> TargetLocator<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        Self { ctx, activator: SafeActivator::new(ctx) }
    }

    /// Finds, activates and confirms the entry for `target`.
    pub async fn locate(&self, target: &TargetName) -> Result<CandidateEntry, HarvestError> {
        let mut matched_but_inert = false;

        for strategy in LocateStrategy::ORDER {
            let Some(candidate) = self.candidate(strategy, target).await else {
                info!("'{}' not found via {:?}", target, strategy);
                continue;
            };

            info!("Found '{}' via {:?}", candidate.label, strategy);
            if self.open_entry(&candidate).await {
                return Ok(candidate);
            }
            warn!("Entry for '{}' did not open its conversation", target);
            matched_but_inert = true;
        }

        if matched_but_inert {
            Err(HarvestError::InteractionFailed(Interaction::ChatOpen))
        } else {
            Err(HarvestError::NotFound(target.to_string()))
        }
    }

    pub async fn candidate(&self, strategy: LocateStrategy, target: &TargetName) -> Option<CandidateEntry> {
        match strategy {
            LocateStrategy::Search => self.search(target).await,
            LocateStrategy::SidebarScan => self.scan_sidebar(target).await,
        }
    }

    /// Types the name into the search field and picks the exact match among results.
    pub async fn search(&self, target: &TargetName) -> Option<CandidateEntry> {
        let selectors = self.ctx.selectors();
        let timeout = self.ctx.timeouts().element();

        let Some(search_box) = self.ctx.ui.wait_for(&selectors.search_box, timeout).await else {
            info!("Search box unavailable");
            return None;
        };
        if let Err(e) = self.ctx.ui.type_text(&search_box, target.as_str()).await {
            warn!("Could not type into search box: {}", e);
            return None;
        }
        self.ctx.pacer.pause(Pause::Action).await;

        let found = match self.ctx.ui.wait_for(&selectors.search_result, timeout).await {
            Some(_) => self.exact_match(&selectors.search_result, target, LocateStrategy::Search).await,
            None => None,
        };

        if found.is_none() {
            // Restore the unfiltered list for the sidebar scan.
            if let Err(e) = self.ctx.ui.type_text(&search_box, "").await {
                debug!("Could not clear search box: {}", e);
            }
        }
        found
    }

    /// Looks only at rows already rendered; does not scroll.
    pub async fn scan_sidebar(&self, target: &TargetName) -> Option<CandidateEntry> {
        self.exact_match(&self.ctx.selectors().sidebar_row, target, LocateStrategy::SidebarScan)
            .await
    }

    async fn exact_match(
        &self,
        row_selector: &str,
        target: &TargetName,
        via: LocateStrategy,
    ) -> Option<CandidateEntry> {
        let rows = match self.ctx.ui.find_all(None, row_selector).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Listing candidate rows failed: {}", e);
                return None;
            }
        };

        for row in rows {
            let Some(label) = self.label_of(&row).await else {
                continue;
            };
            if target.matches(&label) {
                return Some(CandidateEntry { label: label.trim().to_string(), element: row, via });
            }
            debug!("Rejected candidate '{}'", label);
        }
        None
    }

    async fn label_of(&self, row: &Element) -> Option<String> {
        let title = self.ctx.ui.find(Some(row), &self.ctx.selectors().row_title).await.ok()??;
        self.ctx.ui.attribute(&title, "title").await.ok()?
    }

    async fn open_entry(&self, candidate: &CandidateEntry) -> bool {
        if !self.activator.activate(&candidate.element).await {
            return false;
        }
        self.ctx.pacer.pause(Pause::Action).await;
        self.ctx
            .ui
            .wait_for(&self.ctx.selectors().conversation, self.ctx.timeouts().element())
            .await
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{Effect, FakeUi, test_settings};
    use crate::pacing::NoPacing;

    /// A candidate row titled `label` that opens the conversation when clicked.
    fn row(ui: &FakeUi, handle: &str, label: &str) {
        let title = format!("{}-title", handle);
        ui.add(Some(handle), "title", &[title.as_str()]);
        ui.attr(&title, "title", label);
        ui.on_click(handle, Effect::set(None, "main", &["main"]));
    }

    #[tokio::test(start_paused = true)]
    async fn search_selects_only_the_exact_label() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(None, "search-box", &["search"]);
        ui.on_type("search", "Team A", Effect::set(None, "search-row", &["ab", "lower", "exact"]));
        row(&ui, "ab", "Team Ab");
        row(&ui, "lower", "team a");
        row(&ui, "exact", " Team A ");
        let locator = TargetLocator::new(EngineContext::new(&ui, &NoPacing, &settings));

        let found = locator.locate(&TargetName::new("Team A")).await.unwrap();

        assert_eq!(found.element, Element::new("exact"));
        assert_eq!(found.label, "Team A");
        assert_eq!(found.via, LocateStrategy::Search);
        assert_eq!(ui.count("click:"), 1);
        assert_eq!(ui.count("click:exact"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lone_partial_result_is_rejected_and_sidebar_used() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(None, "search-box", &["search"]);
        ui.on_type("search", "Team A", Effect::set(None, "search-row", &["partial"]));
        row(&ui, "partial", "Team Ab");
        ui.add(None, "sidebar-row", &["other", "side"]);
        row(&ui, "other", "Family");
        row(&ui, "side", "Team A");
        let locator = TargetLocator::new(EngineContext::new(&ui, &NoPacing, &settings));

        let found = locator.locate(&TargetName::new("Team A")).await.unwrap();

        assert_eq!(found.element, Element::new("side"));
        assert_eq!(found.via, LocateStrategy::SidebarScan);
        assert!(ui.interactions().contains(&"type:search:".to_string()));
        assert_eq!(ui.count("click:partial"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_search_box_falls_back_to_sidebar() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(None, "sidebar-row", &["side"]);
        row(&ui, "side", "Team A");
        let locator = TargetLocator::new(EngineContext::new(&ui, &NoPacing, &settings));

        let found = locator.locate(&TargetName::new("Team A")).await.unwrap();

        assert_eq!(found.via, LocateStrategy::SidebarScan);
        assert_eq!(ui.count("type:"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn no_exact_label_anywhere_is_not_found() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(None, "search-box", &["search"]);
        ui.on_type("search", "Team A", Effect::set(None, "search-row", &["lower"]));
        row(&ui, "lower", "team a");
        ui.add(None, "sidebar-row", &["side"]);
        row(&ui, "side", "Team A (old)");
        let locator = TargetLocator::new(EngineContext::new(&ui, &NoPacing, &settings));

        let err = locator.locate(&TargetName::new("Team A")).await.unwrap_err();

        assert_eq!(err, HarvestError::NotFound("Team A".into()));
        assert_eq!(ui.count("click:"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rows_without_titles_are_skipped() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(None, "sidebar-row", &["untitled", "side"]);
        row(&ui, "side", "Team A");
        let locator = TargetLocator::new(EngineContext::new(&ui, &NoPacing, &settings));

        let found = locator.scan_sidebar(&TargetName::new("Team A")).await.unwrap();
        assert_eq!(found.element, Element::new("side"));
    }

    #[tokio::test(start_paused = true)]
    async fn exact_match_that_never_opens_is_an_interaction_failure() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(None, "sidebar-row", &["side"]);
        let title = "side-title";
        ui.add(Some("side"), "title", &[title]);
        ui.attr(title, "title", "Team A");
        let locator = TargetLocator::new(EngineContext::new(&ui, &NoPacing, &settings));

        let err = locator.locate(&TargetName::new("Team A")).await.unwrap_err();

        assert_eq!(err, HarvestError::InteractionFailed(Interaction::ChatOpen));
    }
}
