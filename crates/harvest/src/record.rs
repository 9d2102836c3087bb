use std::fmt;

/// Placeholder for a field that could not be read from a row.
pub const NOT_AVAILABLE: &str = "Not available";

/// Name of the entity to harvest, e.g. a group name. Stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetName(String);

impl TargetName {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact equality after trimming. No case folding, no substrings.
    pub fn matches(&self, label: &str) -> bool {
        label.trim() == self.0
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One harvested person. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub display_name: String,
    pub identifier: String,
    pub is_privileged: bool,
}

impl Record {
    pub fn privileged_label(&self) -> &'static str {
        if self.is_privileged { "Yes" } else { "No" }
    }
}

/// Records for one target, in list order. Empty means the target failed.
pub type HarvestResult = Vec<Record>;
