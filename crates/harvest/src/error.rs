use std::fmt;
use thiserror::Error;

/// UI transitions whose success is verified structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Baseline readiness of the interface.
    Ready,
    /// The located entry opened its conversation.
    ChatOpen,
    DetailPanel,
    ListView,
    /// Rows of the opened member list could be enumerated.
    MemberRows,
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Interaction::Ready => "interface readiness",
            Interaction::ChatOpen => "conversation open",
            Interaction::DetailPanel => "detail panel open",
            Interaction::ListView => "member list view",
            Interaction::MemberRows => "readable member list",
        };
        f.write_str(label)
    }
}

/// Terminal failure for one target. Never fatal to the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HarvestError {
    #[error("'{0}' not found by search or sidebar scan")]
    NotFound(String),
    #[error("could not confirm {0}")]
    InteractionFailed(Interaction),
}
