//! Failover Configuration Client

use crate::core::{AdminError, Result};
use crate::gateway::{self, Operation, RemoteGateway};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;

/// Failover mode as the cluster reports it.
///
/// Modes this crate does not know are kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FailoverMode {
    #[default]
    Disabled,
    Eventual,
    Stateful,
    Raft,
    Other(String),
}

impl FailoverMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Disabled => "disabled",
            Self::Eventual => "eventual",
            Self::Stateful => "stateful",
            Self::Raft => "raft",
            Self::Other(mode) => mode.as_str(),
        }
    }

    /// Modes in which a leader can be appointed manually.
    pub fn supports_promotion(&self) -> bool {
        matches!(self, Self::Stateful | Self::Raft)
    }
}

impl From<String> for FailoverMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "disabled" => Self::Disabled,
            "eventual" => Self::Eventual,
            "stateful" => Self::Stateful,
            "raft" => Self::Raft,
            _ => Self::Other(value),
        }
    }
}

impl From<FailoverMode> for String {
    fn from(value: FailoverMode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FailoverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FailoverMode {
    type Err = AdminError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "eventual" => Ok(Self::Eventual),
            "stateful" => Ok(Self::Stateful),
            "raft" => Ok(Self::Raft),
            other => Err(AdminError::InvalidRequest(format!(
                "unknown failover mode '{}'",
                other
            ))),
        }
    }
}

/// Failover policy. State-provider parameters and unknown fields pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailoverConfig {
    pub mode: FailoverMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover_timeout: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fencing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fencing_timeout: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fencing_pause: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tarantool_params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd2_params: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FailoverConfig {
    pub fn with_mode(mode: FailoverMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoteLeaderArgs {
    pub replicaset_uuid: String,
    pub instance_uuid: String,
    #[serde(default)]
    pub force_inconsistency: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfInfo {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub demo_uri: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownRole {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub implies_router: bool,
    #[serde(default)]
    pub implies_storage: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VshardGroup {
    pub name: String,
    #[serde(default)]
    pub bucket_count: Option<u64>,
    #[serde(default)]
    pub bootstrapped: bool,
}

/// The broader cluster descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSelf {
    #[serde(rename = "self", default)]
    pub self_info: SelfInfo,
    #[serde(default)]
    pub failover_params: Option<FailoverConfig>,
    #[serde(default)]
    pub known_roles: Vec<KnownRole>,
    #[serde(default)]
    pub vshard_groups: Vec<VshardGroup>,
    #[serde(default)]
    pub can_bootstrap_vshard: bool,
    #[serde(default)]
    pub vshard_bucket_count: Option<u64>,
}

fn cluster_field<T: serde::de::DeserializeOwned>(data: Value, field: &str) -> Result<T> {
    let node = match data {
        Value::Object(mut map) => match map.remove("cluster") {
            Some(Value::Object(mut cluster)) => cluster.remove(field),
            _ => None,
        },
        _ => None,
    };
    let node = node.filter(|node| !node.is_null()).ok_or_else(|| {
        AdminError::MalformedResponse(format!("response has no cluster.{}", field))
    })?;
    serde_json::from_value(node)
        .map_err(|e| AdminError::MalformedResponse(format!("cluster.{}: {}", field, e)))
}

#[derive(Clone)]
pub struct FailoverClient {
    gateway: Arc<dyn RemoteGateway>,
}

impl FailoverClient {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { gateway }
    }

    pub async fn get_failover(&self) -> Result<FailoverConfig> {
        let data = gateway::fetch(self.gateway.as_ref(), Operation::FailoverParams, json!({})).await?;
        cluster_field(data, "failover_params")
    }

    pub async fn cluster_self(&self) -> Result<ClusterSelf> {
        let data = gateway::fetch(self.gateway.as_ref(), Operation::ClusterSelf, json!({})).await?;
        let cluster = match data {
            Value::Object(mut map) => map.remove("cluster"),
            _ => None,
        }
        .filter(Value::is_object)
        .ok_or_else(|| AdminError::MalformedResponse("response has no cluster".to_string()))?;
        serde_json::from_value(cluster)
            .map_err(|e| AdminError::MalformedResponse(format!("cluster self: {}", e)))
    }

    /// Submits the new policy, then re-reads the cluster descriptor.
    ///
    /// The mutation's own result is discarded; the returned value is always
    /// the re-fetched one.
    pub async fn change_failover(&self, config: FailoverConfig) -> Result<ClusterSelf> {
        let variables = serde_json::to_value(&config)
            .map_err(|e| AdminError::InvalidRequest(format!("cannot encode failover config: {}", e)))?;
        gateway::mutate(self.gateway.as_ref(), Operation::ChangeFailover, variables).await?;
        info!("failover mode changed to {}", config.mode);
        self.cluster_self().await
    }

    /// Appoints a leader. Returns the backend acknowledgment only.
    pub async fn promote_failover_leader(&self, args: PromoteLeaderArgs) -> Result<bool> {
        if args.replicaset_uuid.is_empty() || args.instance_uuid.is_empty() {
            return Err(AdminError::InvalidRequest(
                "promotion needs both a replicaset and an instance uuid".to_string(),
            ));
        }
        let variables = serde_json::to_value(&args)
            .map_err(|e| AdminError::InvalidRequest(format!("cannot encode promotion: {}", e)))?;
        let data =
            gateway::mutate(self.gateway.as_ref(), Operation::PromoteFailoverLeader, variables)
                .await?;
        cluster_field(data, "failover_promote")
    }
}
