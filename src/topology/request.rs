use crate::core::{AdminError, Result, TopologySnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Patch for one existing server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerPatch {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expelled: Option<bool>,
}

impl ServerPatch {
    pub fn disable(uuid: &str, disabled: bool) -> Self {
        Self {
            uuid: uuid.to_string(),
            disabled: Some(disabled),
            expelled: None,
        }
    }

    pub fn expel(uuid: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            disabled: None,
            expelled: Some(true),
        }
    }

    fn is_empty(&self) -> bool {
        self.disabled.is_none() && self.expelled.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinServer {
    pub uri: String,
}

/// Patch for one replica-set; a patch without `uuid` creates a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicasetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_rw: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vshard_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover_priority: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_servers: Option<Vec<JoinServer>>,
}

/// The single batched mutation contract for topology changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyEditRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<ServerPatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicasets: Option<Vec<ReplicasetPatch>>,
}

impl TopologyEditRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(mut self, patch: ServerPatch) -> Self {
        self.servers.get_or_insert_with(Vec::new).push(patch);
        self
    }

    pub fn replicaset(mut self, patch: ReplicasetPatch) -> Self {
        self.replicasets.get_or_insert_with(Vec::new).push(patch);
        self
    }

    pub fn patch_count(&self) -> usize {
        self.servers.as_ref().map_or(0, Vec::len) + self.replicasets.as_ref().map_or(0, Vec::len)
    }

    /// Local contract checks that do not need the cluster state.
    pub fn validate(&self) -> Result<()> {
        if self.patch_count() == 0 {
            return Err(AdminError::InvalidRequest(
                "topology edit must contain at least one patch".to_string(),
            ));
        }

        let mut server_uuids = HashSet::new();
        for patch in self.servers.iter().flatten() {
            if patch.uuid.is_empty() {
                return Err(AdminError::InvalidRequest(
                    "server patch has an empty uuid".to_string(),
                ));
            }
            if patch.is_empty() {
                return Err(AdminError::InvalidRequest(format!(
                    "server patch for '{}' changes nothing",
                    patch.uuid
                )));
            }
            if !server_uuids.insert(patch.uuid.as_str()) {
                return Err(AdminError::InvalidRequest(format!(
                    "server '{}' is patched twice",
                    patch.uuid
                )));
            }
        }

        let mut replicaset_uuids = HashSet::new();
        for patch in self.replicasets.iter().flatten() {
            match patch.uuid.as_deref() {
                Some("") => {
                    return Err(AdminError::InvalidRequest(
                        "replicaset patch has an empty uuid".to_string(),
                    ));
                }
                Some(uuid) => {
                    if !replicaset_uuids.insert(uuid) {
                        return Err(AdminError::InvalidRequest(format!(
                            "replicaset '{}' is patched twice",
                            uuid
                        )));
                    }
                }
                None => {
                    if patch.join_servers.as_ref().is_none_or(Vec::is_empty) {
                        return Err(AdminError::InvalidRequest(
                            "a new replicaset needs at least one server to join".to_string(),
                        ));
                    }
                }
            }
            if let Some(priority) = &patch.failover_priority {
                if priority.is_empty() {
                    return Err(AdminError::InvalidRequest(
                        "failover priority must not be empty".to_string(),
                    ));
                }
                let mut seen = HashSet::new();
                if let Some(duplicate) = priority.iter().find(|uuid| !seen.insert(uuid.as_str())) {
                    return Err(AdminError::InvalidRequest(format!(
                        "server '{}' appears twice in failover priority",
                        duplicate
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks every patched uuid against a snapshot of the cluster.
    pub fn check_against(&self, snapshot: &TopologySnapshot) -> Result<()> {
        for patch in self.servers.iter().flatten() {
            if snapshot.server(&patch.uuid).is_none() {
                return Err(AdminError::InvalidRequest(format!(
                    "server '{}' is not in the topology",
                    patch.uuid
                )));
            }
        }
        for patch in self.replicasets.iter().flatten() {
            if let Some(uuid) = patch.uuid.as_deref() {
                let replicaset = snapshot.replicaset(uuid).ok_or_else(|| {
                    AdminError::InvalidRequest(format!("replicaset '{}' is not in the topology", uuid))
                })?;
                for member in patch.failover_priority.iter().flatten() {
                    if !replicaset.contains(member) {
                        return Err(AdminError::InvalidRequest(format!(
                            "server '{}' is not a member of replicaset '{}'",
                            member, uuid
                        )));
                    }
                }
            }
            for join in patch.join_servers.iter().flatten() {
                if snapshot
                    .server_by_uri(&join.uri)
                    .is_some_and(|server| server.is_configured())
                {
                    return Err(AdminError::InvalidRequest(format!(
                        "server '{}' is already joined",
                        join.uri
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_not_serialized() {
        let request = TopologyEditRequest::new().server(ServerPatch::expel("srv1"));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"servers": [{"uuid": "srv1", "expelled": true}]})
        );
    }

    #[test]
    fn validation_rejects_empty_and_duplicate_patches() {
        assert!(TopologyEditRequest::new().validate().is_err());

        let duplicate = TopologyEditRequest::new()
            .server(ServerPatch::disable("a", true))
            .server(ServerPatch::expel("a"));
        assert!(matches!(
            duplicate.validate(),
            Err(AdminError::InvalidRequest(_))
        ));

        let creation_without_members = TopologyEditRequest::new().replicaset(ReplicasetPatch {
            alias: Some("storage".to_string()),
            ..ReplicasetPatch::default()
        });
        assert!(creation_without_members.validate().is_err());
    }
}
