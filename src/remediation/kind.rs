use crate::core::SuggestionKind;
use crate::gateway::Operation;
use serde::{Deserialize, Serialize};

/// Suggestions that have a remediation mutation behind them.
///
/// Every kind submits `{uuids: [...]}` to its own mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationKind {
    RestartReplication,
    ForceConfigReapply,
    DisableServers,
}

impl RemediationKind {
    pub const ALL: [RemediationKind; 3] = [
        RemediationKind::RestartReplication,
        RemediationKind::ForceConfigReapply,
        RemediationKind::DisableServers,
    ];

    pub fn operation(self) -> Operation {
        match self {
            Self::RestartReplication => Operation::RestartReplication,
            Self::ForceConfigReapply => Operation::ConfigForceReapply,
            Self::DisableServers => Operation::DisableServers,
        }
    }

    pub fn suggestion_kind(self) -> SuggestionKind {
        match self {
            Self::RestartReplication => SuggestionKind::RestartReplication,
            Self::ForceConfigReapply => SuggestionKind::ForceApply,
            Self::DisableServers => SuggestionKind::DisableServers,
        }
    }

    pub fn from_suggestion(kind: SuggestionKind) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|remediation| remediation.suggestion_kind() == kind)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::RestartReplication => "Restart replication",
            Self::ForceConfigReapply => "Force apply configuration",
            Self::DisableServers => "Disable instances",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::RestartReplication => {
                "The replication isn't all right. Restart it, maybe it helps."
            }
            Self::ForceConfigReapply => {
                "Some instances are misconfigured. You can heal it by reapplying configuration forcefully."
            }
            Self::DisableServers => {
                "Some instances are malfunctioning and impede editing clusterwide configuration. Disable them temporarily if you want to operate topology."
            }
        }
    }
}
