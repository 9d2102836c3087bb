//! Target list loading: one group name per line, first column only.

use anyhow::{Context, Result};
use rollcall_harvest::TargetName;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub fn load_targets(path: &Path) -> Result<Vec<TargetName>> {
    let file = File::open(path).with_context(|| format!("Cannot open input file {}", path.display()))?;
    read_targets(file).with_context(|| format!("Cannot read targets from {}", path.display()))
}

pub fn read_targets<R: Read>(reader: R) -> Result<Vec<TargetName>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut targets = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Malformed CSV at record {}", index + 1))?;
        match record.get(0) {
            Some(name) if !name.is_empty() => targets.push(TargetName::new(name)),
            _ => debug!("Skipping empty record {}", index + 1),
        }
    }
    Ok(targets)
}
