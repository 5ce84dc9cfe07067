use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Diagnostic snapshot of a server's engine state, kept as the cluster sent it.
pub type Boxinfo = Map<String, Value>;

/// Lifecycle status reported for a server.
///
/// Statuses this crate does not know are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServerStatus {
    Healthy,
    Unhealthy,
    Warning,
    Unreachable,
    Expelled,
    Unconfigured,
    Other(String),
}

impl ServerStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::Warning => "warning",
            Self::Unreachable => "unreachable",
            Self::Expelled => "expelled",
            Self::Unconfigured => "unconfigured",
            Self::Other(status) => status.as_str(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl Default for ServerStatus {
    fn default() -> Self {
        Self::Unconfigured
    }
}

impl From<String> for ServerStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "healthy" => Self::Healthy,
            "unhealthy" => Self::Unhealthy,
            "warning" => Self::Warning,
            "unreachable" => Self::Unreachable,
            "expelled" => Self::Expelled,
            "unconfigured" => Self::Unconfigured,
            _ => Self::Other(value),
        }
    }
}

impl From<ServerStatus> for String {
    fn from(value: ServerStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cluster instance as seen by the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Empty for servers that were discovered but never joined a replica-set.
    pub uuid: String,
    pub uri: String,
    pub alias: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub status: ServerStatus,
    pub message: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Position in the replica-set failover order, 1-based.
    pub priority: Option<u32>,
    #[serde(default)]
    pub boxinfo: Boxinfo,
    /// `None` means the read-only state is unknown, which is not the same as `Some(false)`.
    pub ro: Option<bool>,
    pub replicaset_uuid: Option<String>,
}

impl Server {
    /// `"uri (alias)"`, or just the uri when the server has no alias.
    pub fn display_label(&self) -> String {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => format!("{} ({})", self.uri, alias),
            _ => self.uri.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.replicaset_uuid.is_some()
    }
}

/// A group of servers holding the same shard of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replicaset {
    pub uuid: String,
    pub alias: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub vshard_group: Option<String>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub all_rw: bool,
    pub master_uuid: Option<String>,
    pub active_master_uuid: Option<String>,
    /// Member uuids, master candidate first.
    pub failover_priority: Vec<String>,
    pub servers: Vec<Server>,
}

impl Replicaset {
    pub fn contains(&self, server_uuid: &str) -> bool {
        self.servers.iter().any(|server| server.uuid == server_uuid)
    }

    pub fn master(&self) -> Option<&Server> {
        let uuid = self.master_uuid.as_deref()?;
        self.servers.iter().find(|server| server.uuid == uuid)
    }
}

/// A problem the cluster reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub level: String,
    pub topic: Option<String>,
    pub message: String,
    pub instance_uuid: Option<String>,
    pub replicaset_uuid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    RestartReplication,
    ForceApply,
    DisableServers,
    RefineUri,
}

impl SuggestionKind {
    pub const ALL: [SuggestionKind; 4] = [
        SuggestionKind::RestartReplication,
        SuggestionKind::ForceApply,
        SuggestionKind::DisableServers,
        SuggestionKind::RefineUri,
    ];

    /// Key of this kind inside `cluster.suggestions`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RestartReplication => "restart_replication",
            Self::ForceApply => "force_apply",
            Self::DisableServers => "disable_servers",
            Self::RefineUri => "refine_uri",
        }
    }
}

/// A cluster-computed recommendation and the servers it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStat {
    pub uuid: String,
    pub uri: Option<String>,
    pub statistics: Map<String, Value>,
}

/// Field descriptions published by the cluster for each boxinfo section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxinfoDescriptions {
    pub cartridge: BTreeMap<String, String>,
    pub general: BTreeMap<String, String>,
    pub network: BTreeMap<String, String>,
    pub replication: BTreeMap<String, String>,
    pub storage: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDetails {
    pub uuid: String,
    pub alias: Option<String>,
    pub uri: String,
    pub status: ServerStatus,
    pub message: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub boxinfo: Boxinfo,
    pub roles: Vec<String>,
    pub master_uuid: Option<String>,
    pub active_master_uuid: Option<String>,
    pub descriptions: BoxinfoDescriptions,
}

/// The part of the detail view that is re-polled while the view is open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerDetailsRefresh {
    pub boxinfo: Boxinfo,
    pub labels: BTreeMap<String, String>,
}
