use super::request::{JoinServer, ReplicasetPatch, ServerPatch, TopologyEditRequest};
use crate::core::{AdminError, Result};
use crate::gateway::{self, Operation, RemoteGateway};
use crate::store::TopologyStore;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Uuids the backend reports as affected by an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEditAck {
    pub servers: Vec<String>,
    pub replicasets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateReplicasetArgs {
    pub alias: Option<String>,
    pub roles: Vec<String>,
    pub vshard_group: Option<String>,
    pub weight: Option<f64>,
    pub all_rw: Option<bool>,
    /// Uris of the instances that form the new replica-set.
    pub join_servers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditReplicasetArgs {
    pub uuid: String,
    pub alias: Option<String>,
    pub roles: Option<Vec<String>>,
    pub vshard_group: Option<String>,
    pub weight: Option<f64>,
    pub all_rw: Option<bool>,
    pub failover_priority: Option<Vec<String>>,
    /// Shorthand for a failover priority that starts with this server.
    pub master: Option<String>,
}

/// Turns operator intents into topology mutations.
///
/// Every method submits exactly one mutation and never refreshes; callers
/// re-query through the store when they want to see the effect.
#[derive(Clone)]
pub struct TopologyClient {
    gateway: Arc<dyn RemoteGateway>,
    store: Option<Arc<TopologyStore>>,
}

fn bool_at(data: &Value, path: &[&str]) -> Result<bool> {
    let mut node = data;
    for key in path {
        node = node.get(key).unwrap_or(&Value::Null);
    }
    node.as_bool().ok_or_else(|| {
        AdminError::MalformedResponse(format!("expected a boolean at '{}'", path.join(".")))
    })
}

fn uuids_at(node: Option<&Value>) -> Vec<String> {
    node.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("uuid").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl TopologyClient {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            store: None,
        }
    }

    /// Pre-checks patched uuids against the store's current snapshot.
    pub fn attached(gateway: Arc<dyn RemoteGateway>, store: Arc<TopologyStore>) -> Self {
        Self {
            gateway,
            store: Some(store),
        }
    }

    pub async fn probe(&self, uri: &str) -> Result<bool> {
        if uri.trim().is_empty() {
            return Err(AdminError::InvalidRequest("probe uri must not be empty".to_string()));
        }
        let data = gateway::mutate(
            self.gateway.as_ref(),
            Operation::ProbeServer,
            json!({ "uri": uri }),
        )
        .await?;
        bool_at(&data, &["probe_server"])
    }

    pub async fn bootstrap_vshard(&self) -> Result<bool> {
        let data =
            gateway::mutate(self.gateway.as_ref(), Operation::BootstrapVshard, json!({})).await?;
        bool_at(&data, &["bootstrap_vshard"])
    }

    pub async fn join_server(&self, uri: &str, replicaset_uuid: &str) -> Result<TopologyEditAck> {
        self.edit_topology(TopologyEditRequest::new().replicaset(ReplicasetPatch {
            uuid: Some(replicaset_uuid.to_string()),
            join_servers: Some(vec![JoinServer {
                uri: uri.to_string(),
            }]),
            ..ReplicasetPatch::default()
        }))
        .await
    }

    pub async fn expel_server(&self, uuid: &str) -> Result<TopologyEditAck> {
        self.edit_servers(vec![ServerPatch::expel(uuid)]).await
    }

    pub async fn disable_server(&self, uuid: &str, disable: bool) -> Result<TopologyEditAck> {
        self.edit_servers(vec![ServerPatch::disable(uuid, disable)]).await
    }

    pub async fn create_replicaset(&self, args: CreateReplicasetArgs) -> Result<TopologyEditAck> {
        let patch = ReplicasetPatch {
            uuid: None,
            alias: args.alias,
            all_rw: args.all_rw,
            roles: Some(args.roles),
            vshard_group: args.vshard_group,
            weight: args.weight,
            failover_priority: None,
            join_servers: Some(
                args.join_servers
                    .into_iter()
                    .map(|uri| JoinServer { uri })
                    .collect(),
            ),
        };
        self.edit_topology(TopologyEditRequest::new().replicaset(patch))
            .await
    }

    pub async fn edit_replicaset(&self, args: EditReplicasetArgs) -> Result<TopologyEditAck> {
        let failover_priority = match (args.failover_priority, args.master) {
            (Some(_), Some(_)) => {
                return Err(AdminError::InvalidRequest(
                    "give either a master or a failover priority, not both".to_string(),
                ));
            }
            (Some(priority), None) => Some(priority),
            (None, Some(master)) => Some(vec![master]),
            (None, None) => None,
        };
        let patch = ReplicasetPatch {
            uuid: Some(args.uuid),
            alias: args.alias,
            all_rw: args.all_rw,
            roles: args.roles,
            vshard_group: args.vshard_group,
            weight: args.weight,
            failover_priority,
            join_servers: None,
        };
        self.edit_topology(TopologyEditRequest::new().replicaset(patch))
            .await
    }

    /// Coalesces several server patches into one mutation.
    pub async fn edit_servers(&self, patches: Vec<ServerPatch>) -> Result<TopologyEditAck> {
        self.edit_topology(TopologyEditRequest {
            servers: Some(patches),
            replicasets: None,
        })
        .await
    }

    pub async fn edit_topology(&self, request: TopologyEditRequest) -> Result<TopologyEditAck> {
        request.validate()?;
        if let Some(store) = &self.store {
            request.check_against(&*store.snapshot()?)?;
        }

        let variables = serde_json::to_value(&request)
            .map_err(|e| AdminError::InvalidRequest(format!("cannot encode topology edit: {}", e)))?;
        let data = gateway::mutate(self.gateway.as_ref(), Operation::EditTopology, variables).await?;

        let edit = data
            .get("cluster")
            .and_then(|cluster| cluster.get("edit_topology"))
            .filter(|edit| edit.is_object())
            .ok_or_else(|| {
                AdminError::MalformedResponse("edit_topology result is missing".to_string())
            })?;
        let ack = TopologyEditAck {
            servers: uuids_at(edit.get("servers")),
            replicasets: uuids_at(edit.get("replicasets")),
        };
        info!(
            "topology edit applied: {} patches, {} servers and {} replicasets affected",
            request.patch_count(),
            ack.servers.len(),
            ack.replicasets.len()
        );
        Ok(ack)
    }
}
