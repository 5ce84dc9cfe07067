use super::types::{Issue, Replicaset, Server, ServerStat, Suggestion, SuggestionKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable view of the cluster produced by one refresh.
///
/// Never patched in place; a refresh builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub servers: Vec<Server>,
    pub replicasets: Vec<Replicaset>,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<Suggestion>,
    pub server_stat: Option<Vec<ServerStat>>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl TopologySnapshot {
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty() && self.replicasets.is_empty()
    }

    pub fn server(&self, uuid: &str) -> Option<&Server> {
        if uuid.is_empty() {
            return None;
        }
        self.servers.iter().find(|server| server.uuid == uuid)
    }

    pub fn server_by_uri(&self, uri: &str) -> Option<&Server> {
        self.servers.iter().find(|server| server.uri == uri)
    }

    pub fn replicaset(&self, uuid: &str) -> Option<&Replicaset> {
        self.replicasets.iter().find(|replicaset| replicaset.uuid == uuid)
    }

    /// Replica-set the server is a member of.
    pub fn replicaset_of(&self, server_uuid: &str) -> Option<&Replicaset> {
        self.replicasets
            .iter()
            .find(|replicaset| replicaset.contains(server_uuid))
    }

    /// Servers discovered by probing that have not joined a replica-set yet.
    pub fn unconfigured_servers(&self) -> impl Iterator<Item = &Server> {
        self.servers.iter().filter(|server| !server.is_configured())
    }

    /// Label for a server uuid; the raw uuid when the server is unknown.
    pub fn server_label(&self, uuid: &str) -> String {
        self.server(uuid)
            .map(Server::display_label)
            .unwrap_or_else(|| uuid.to_string())
    }

    pub fn suggestion(&self, kind: SuggestionKind) -> Option<&Suggestion> {
        self.suggestions.iter().find(|suggestion| suggestion.kind == kind)
    }

    pub fn suggestion_targets(&self, kind: SuggestionKind) -> Vec<String> {
        self.suggestion(kind)
            .map(|suggestion| suggestion.targets.clone())
            .unwrap_or_default()
    }

    pub fn stat_for(&self, uuid: &str) -> Option<&ServerStat> {
        self.server_stat
            .as_ref()?
            .iter()
            .find(|stat| stat.uuid == uuid)
    }
}
