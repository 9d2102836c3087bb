//! Console tables and CSV export.

use anyhow::{Context, Result};
use rollcall_harvest::{Outcome, Record, TargetHarvest};
use serde::Serialize;
use std::path::Path;
use textwrap::core::display_width;

const HEADERS: [&str; 3] = ["Name", "Phone", "Is Admin"];

/// Grid table: a `=` rule under the header, a `-` rule between rows.
pub fn render_table(records: &[Record]) -> String {
    if records.is_empty() {
        return "No contacts found!".to_string();
    }

    let rows: Vec<[&str; 3]> = records
        .iter()
        .map(|r| [r.display_name.as_str(), r.identifier.as_str(), r.privileged_label()])
        .collect();

    let mut widths = HEADERS.map(display_width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let rule = |fill: char| {
        let segments: Vec<String> = widths.iter().map(|w| fill.to_string().repeat(w + 2)).collect();
        format!("+{}+", segments.join("+"))
    };
    let line = |cells: &[&str; 3]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!(" {}{} ", cell, " ".repeat(width - display_width(cell))))
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut out = vec![rule('-'), line(&HEADERS), rule('=')];
    for row in &rows {
        out.push(line(row));
        out.push(rule('-'));
    }
    out.join("\n")
}

pub fn render_harvest(harvest: &TargetHarvest) -> String {
    let mut out = vec![format!("\n📋 Group: {}", harvest.target)];

    match &harvest.outcome {
        Outcome::Failed(e) => {
            out.push(format!("❌ {}", e));
            return out.join("\n");
        }
        Outcome::Partial(exhaustion) => {
            out.push(format!("⚠️  Member list may be incomplete ({:?})", exhaustion));
        }
        Outcome::Complete => {}
    }

    out.push(render_table(&harvest.records));
    if let (Some(missing), Some(expected)) = (harvest.shortfall(), harvest.expected) {
        out.push(format!("⚠️  {} of {} advertised members were not extracted", missing, expected));
    }
    out.join("\n")
}

pub fn render_summary(harvests: &[TargetHarvest]) -> String {
    let contacts: usize = harvests.iter().map(|h| h.records.len()).sum();
    let failed = harvests.iter().filter(|h| h.is_failed()).count();
    let partial = harvests.iter().filter(|h| matches!(h.outcome, Outcome::Partial(_))).count();

    format!(
        "\n✅ {} groups processed: {} contacts extracted, {} partial, {} failed",
        harvests.len(),
        contacts,
        partial,
        failed
    )
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Group")]
    group: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Phone")]
    phone: &'a str,
    #[serde(rename = "Is Admin")]
    is_admin: &'a str,
}

/// Writes every record of every target; returns the number of data rows.
pub fn export_csv(path: &Path, harvests: &[TargetHarvest]) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;

    let mut written = 0;
    for harvest in harvests {
        for record in &harvest.records {
            writer.serialize(ExportRow {
                group: harvest.target.as_str(),
                name: &record.display_name,
                phone: &record.identifier,
                is_admin: record.privileged_label(),
            })?;
            written += 1;
        }
    }
    writer.flush()?;
    Ok(written)
}
