//! Raw response shapes as the admin API returns them.
//!
//! Every field is optional here; the normalizer decides what is required.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawUuidRef {
    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawLabel {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawServer {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "statusMessage")]
    pub message: Option<String>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub replicaset: Option<RawUuidRef>,
    #[serde(default)]
    pub labels: Option<Vec<RawLabel>>,
    #[serde(default)]
    pub boxinfo: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawReplicaset {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub vshard_group: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub all_rw: Option<bool>,
    #[serde(default)]
    pub master: Option<RawUuidRef>,
    #[serde(default)]
    pub active_master: Option<RawUuidRef>,
    #[serde(default)]
    pub servers: Option<Vec<RawServer>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawIssue {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub instance_uuid: Option<String>,
    #[serde(default)]
    pub replicaset_uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSuggestions {
    #[serde(default)]
    pub restart_replication: Option<Vec<RawUuidRef>>,
    #[serde(default)]
    pub force_apply: Option<Vec<RawUuidRef>>,
    #[serde(default)]
    pub disable_servers: Option<Vec<RawUuidRef>>,
    #[serde(default)]
    pub refine_uri: Option<Vec<RawUuidRef>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawCluster {
    #[serde(default)]
    pub issues: Option<Vec<RawIssue>>,
    #[serde(default)]
    pub suggestions: Option<RawSuggestions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawListResponse {
    #[serde(default, rename = "serverList")]
    pub server_list: Option<Vec<RawServer>>,
    #[serde(default, rename = "replicasetList")]
    pub replicaset_list: Option<Vec<RawReplicaset>>,
    #[serde(default)]
    pub cluster: Option<RawCluster>,
    #[serde(default, rename = "serverStat")]
    pub server_stat: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawStatEntry {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub statistics: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawDetailReplicaset {
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub master: Option<RawUuidRef>,
    #[serde(default)]
    pub active_master: Option<RawUuidRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawDetailServer {
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<RawLabel>>,
    #[serde(default)]
    pub boxinfo: Option<Map<String, Value>>,
    #[serde(default)]
    pub replicaset: Option<RawDetailReplicaset>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawField {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawTypeDescription {
    #[serde(default)]
    pub fields: Option<Vec<RawField>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDetailsResponse {
    #[serde(default)]
    pub servers: Option<Vec<RawDetailServer>>,
    #[serde(default)]
    pub description_cartridge: Option<RawTypeDescription>,
    #[serde(default)]
    pub description_general: Option<RawTypeDescription>,
    #[serde(default)]
    pub description_network: Option<RawTypeDescription>,
    #[serde(default)]
    pub description_replication: Option<RawTypeDescription>,
    #[serde(default)]
    pub description_storage: Option<RawTypeDescription>,
}
