//! Turns materialized list rows into records.
//!
//! Field layout differs between saved and unknown contacts, so each field
//! has an ordered list of readers ending in a sentinel. Only a row whose
//! structure cannot be read at all is dropped.

use crate::record::{NOT_AVAILABLE, Record};
use crate::ui::{Element, UiResult};
use crate::EngineContext;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierStrategy {
    /// Text of the phone element in its usual layout slot.
    PhoneSlot,
    /// Title attribute carrying a `+`-prefixed number.
    PlusTitle,
}

impl IdentifierStrategy {
    pub const ORDER: [IdentifierStrategy; 2] = [IdentifierStrategy::PhoneSlot, IdentifierStrategy::PlusTitle];
}

pub struct RecordExtractor<'a> {
    ctx: EngineContext<'a>,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        Self { ctx }
    }

    /// Total: never fails as a whole.
    pub async fn extract_all(&self, container: &Element) -> Vec<Record> {
        match self.try_extract_all(container).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Could not list rows of {}: {}", container, e);
                Vec::new()
            }
        }
    }

    /// Like [`extract_all`](Self::extract_all), but an unreadable container is
    /// an error instead of an empty list.
    pub async fn try_extract_all(&self, container: &Element) -> UiResult<Vec<Record>> {
        let rows = self.ctx.ui.find_all(Some(container), &self.ctx.selectors().member_row).await?;

        info!("Found {} contacts. Extracting details...", rows.len());
        let every = self.ctx.limits().row_progress_every.max(1);
        let mut records = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            match self.extract_row(row).await {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed row {}: {}", index + 1, e),
            }
            if (index + 1) % every == 0 {
                info!("Processed {}/{} contacts...", index + 1, rows.len());
            }
        }

        info!("Successfully extracted {} contacts", records.len());
        Ok(records)
    }

    /// `Err` means a lookup under the row itself failed. A field element that
    /// was found but could not be read counts as missing.
    pub async fn extract_row(&self, row: &Element) -> UiResult<Record> {
        let display_name = self.display_name(row).await?;
        let identifier = self.identifier(row).await?;
        let is_privileged = self.is_privileged(row).await?;

        Ok(Record {
            display_name: display_name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            identifier: identifier.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            is_privileged,
        })
    }

    pub async fn display_name(&self, row: &Element) -> UiResult<Option<String>> {
        let selectors = self.ctx.selectors();
        let Some(span) = self.ctx.ui.find(Some(row), &selectors.member_name).await? else {
            return Ok(None);
        };
        let label = readable(self.ctx.ui.attribute(&span, "aria-label").await, &span).flatten();
        let label = label.unwrap_or_default();
        let label = label.trim();
        let name = label.strip_prefix(selectors.name_decoration.as_str()).unwrap_or(label);
        Ok(non_empty(name))
    }

    pub async fn identifier(&self, row: &Element) -> UiResult<Option<String>> {
        for strategy in IdentifierStrategy::ORDER {
            if let Some(value) = self.identifier_with(strategy, row).await? {
                return Ok(Some(value));
            }
            debug!("{:?} found no identifier", strategy);
        }
        Ok(None)
    }

    pub async fn identifier_with(&self, strategy: IdentifierStrategy, row: &Element) -> UiResult<Option<String>> {
        let selectors = self.ctx.selectors();
        match strategy {
            IdentifierStrategy::PhoneSlot => {
                let Some(slot) = self.ctx.ui.find(Some(row), &selectors.phone_slot).await? else {
                    return Ok(None);
                };
                let text = readable(self.ctx.ui.text(&slot).await, &slot).unwrap_or_default();
                Ok(non_empty(&text))
            }
            IdentifierStrategy::PlusTitle => {
                let Some(span) = self.ctx.ui.find(Some(row), &selectors.phone_title).await? else {
                    return Ok(None);
                };
                let title = readable(self.ctx.ui.attribute(&span, "title").await, &span).flatten();
                let title = title.unwrap_or_default();
                if !title.contains('+') {
                    return Ok(None);
                }
                Ok(non_empty(&title))
            }
        }
    }

    /// Presence test; a missing marker means `false`, never unknown.
    pub async fn is_privileged(&self, row: &Element) -> UiResult<bool> {
        let selectors = self.ctx.selectors();
        for badge in self.ctx.ui.find_all(Some(row), &selectors.role_badge).await? {
            let Some(text) = readable(self.ctx.ui.text(&badge).await, &badge) else {
                continue;
            };
            if text.contains(selectors.role_marker.as_str()) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// A read on an element already found inside a row. Failure is a missing field.
fn readable<T>(result: UiResult<T>, element: &Element) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Field element {} unreadable: {}", element, e);
            None
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() { None } else { Some(value.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeUi, test_settings};
    use crate::pacing::NoPacing;
    use crate::ui::UiError;

    fn alice(ui: &FakeUi) {
        ui.add(Some("alice"), "member-name", &["alice-name"]);
        ui.attr("alice-name", "aria-label", "Alice");
        ui.add(Some("alice"), "phone-title", &["alice-phone"]);
        ui.attr("alice-phone", "title", "+1 555-0100");
        ui.add(Some("alice"), "badge", &["alice-status", "alice-role"]);
        ui.set_text("alice-status", "Hey there!");
        ui.set_text("alice-role", "Group admin");
    }

    #[tokio::test]
    async fn full_and_empty_rows_match_the_record_shape() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("list"), "member-row", &["alice", "bare"]);
        alice(&ui);
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let records = extractor.extract_all(&Element::new("list")).await;

        assert_eq!(
            records,
            vec![
                Record {
                    display_name: "Alice".into(),
                    identifier: "+1 555-0100".into(),
                    is_privileged: true,
                },
                Record {
                    display_name: NOT_AVAILABLE.into(),
                    identifier: NOT_AVAILABLE.into(),
                    is_privileged: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn phone_slot_wins_over_title() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("row"), "phone-slot", &["slot"]);
        ui.set_text("slot", " +44 20 7946 0000 ");
        ui.add(Some("row"), "phone-title", &["titled"]);
        ui.attr("titled", "title", "+1 555-0100");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let id = extractor.identifier(&Element::new("row")).await.unwrap();
        assert_eq!(id.as_deref(), Some("+44 20 7946 0000"));
    }

    #[tokio::test]
    async fn blank_phone_slot_falls_through_to_title() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("row"), "phone-slot", &["slot"]);
        ui.set_text("slot", "   ");
        ui.add(Some("row"), "phone-title", &["titled"]);
        ui.attr("titled", "title", "+1 555-0100");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let id = extractor.identifier(&Element::new("row")).await.unwrap();
        assert_eq!(id.as_deref(), Some("+1 555-0100"));
    }

    #[tokio::test]
    async fn title_without_plus_is_not_an_identifier() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("row"), "phone-title", &["titled"]);
        ui.attr("titled", "title", "Available");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let record = extractor.extract_row(&Element::new("row")).await.unwrap();
        assert_eq!(record.identifier, NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn unsaved_contact_decoration_is_stripped() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("row"), "member-name", &["name"]);
        ui.attr("name", "aria-label", "Maybe Bob ");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let name = extractor.display_name(&Element::new("row")).await.unwrap();
        assert_eq!(name.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn blank_label_is_the_sentinel_not_an_empty_string() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("row"), "member-name", &["name"]);
        ui.attr("name", "aria-label", "  ");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let record = extractor.extract_row(&Element::new("row")).await.unwrap();
        assert_eq!(record.display_name, NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn marker_must_appear_in_text() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("row"), "badge", &["status"]);
        ui.set_text("status", "Busy");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        assert!(!extractor.is_privileged(&Element::new("row")).await.unwrap());
    }

    #[tokio::test]
    async fn stale_field_elements_leave_the_row_intact() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("list"), "member-row", &["alice"]);
        ui.add(Some("alice"), "member-name", &["alice-name"]);
        ui.attr("alice-name", "aria-label", "Alice");
        ui.add(Some("alice"), "phone-title", &["alice-phone"]);
        ui.stale("alice-phone");
        ui.add(Some("alice"), "badge", &["alice-role"]);
        ui.stale("alice-role");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let records = extractor.extract_all(&Element::new("list")).await;

        assert_eq!(
            records,
            vec![Record {
                display_name: "Alice".into(),
                identifier: NOT_AVAILABLE.into(),
                is_privileged: false,
            }]
        );
    }

    #[tokio::test]
    async fn unreadable_slot_falls_through_to_title_and_badges_are_skipped() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("row"), "member-name", &["name"]);
        ui.stale("name");
        ui.add(Some("row"), "phone-slot", &["slot"]);
        ui.broken("slot");
        ui.add(Some("row"), "phone-title", &["titled"]);
        ui.attr("titled", "title", "+1 555-0100");
        ui.add(Some("row"), "badge", &["gone", "role"]);
        ui.stale("gone");
        ui.set_text("role", "Group admin");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let record = extractor.extract_row(&Element::new("row")).await.unwrap();

        assert_eq!(record.display_name, NOT_AVAILABLE);
        assert_eq!(record.identifier, "+1 555-0100");
        assert!(record.is_privileged);
    }

    #[tokio::test]
    async fn malformed_rows_are_dropped_without_aborting_the_batch() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.add(Some("list"), "member-row", &["alice", "broken", "gone", "bare"]);
        alice(&ui);
        ui.broken("broken");
        ui.stale("gone");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let records = extractor.extract_all(&Element::new("list")).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].display_name, "Alice");
        assert_eq!(records[1].display_name, NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn every_well_formed_row_yields_one_complete_record() {
        let ui = FakeUi::new();
        let settings = test_settings();
        let handles: Vec<String> = (0..120).map(|i| format!("row{}", i)).collect();
        let refs: Vec<&str> = handles.iter().map(String::as_str).collect();
        ui.add(Some("list"), "member-row", &refs);
        for (i, handle) in handles.iter().enumerate().filter(|(i, _)| i % 3 == 0) {
            let name = format!("{}-name", handle);
            ui.add(Some(handle.as_str()), "member-name", &[name.as_str()]);
            ui.attr(&name, "aria-label", &format!("Member {}", i));
        }
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        let records = extractor.extract_all(&Element::new("list")).await;

        assert_eq!(records.len(), 120);
        assert!(records.iter().all(|r| !r.display_name.is_empty() && !r.identifier.is_empty()));
        assert_eq!(records[3].display_name, "Member 3");
        assert_eq!(records[4].display_name, NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn unreadable_container_yields_no_records() {
        let ui = FakeUi::new();
        let settings = test_settings();
        ui.stale("list");
        let extractor = RecordExtractor::new(EngineContext::new(&ui, &NoPacing, &settings));

        assert!(extractor.extract_all(&Element::new("list")).await.is_empty());
        assert!(matches!(
            extractor.try_extract_all(&Element::new("list")).await,
            Err(UiError::Stale(_))
        ));
    }
}
