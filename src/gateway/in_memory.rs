use super::{GatewayRequest, Operation, RemoteGateway};
use crate::core::{GatewayError, GatewayResult, SuggestionKind};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// The simulated cluster is split by responsibility for easier navigation.
include!("in_memory/state.rs");
include!("in_memory/render.rs");
include!("in_memory/mutations.rs");

#[derive(Debug, Default)]
struct InMemoryInner {
    state: ClusterState,
    calls: Vec<GatewayRequest>,
    failures: HashMap<Operation, VecDeque<GatewayError>>,
    upload_failures: VecDeque<GatewayError>,
    uploads: Vec<Vec<u8>>,
}

/// An in-memory implementation of `RemoteGateway` for tests and demos.
///
/// Holds a simulated cluster and answers every operation the console issues
/// with the same `data` shapes the admin API produces. Mutations are applied
/// atomically: a rejected request leaves the simulated cluster untouched.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    inner: Arc<Mutex<InMemoryInner>>,
}

impl InMemoryGateway {
    /// Creates a gateway with an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// A small ready-made cluster: one router, one two-member storage
    /// replica-set and one probed but unconfigured instance.
    pub fn demo() -> Self {
        let gateway = Self::new();
        gateway.add_replicaset("rs-router", "router", &["vshard-router"], &[("srv-1", "localhost:3301")]);
        gateway.add_replicaset(
            "rs-storage",
            "storage",
            &["vshard-storage"],
            &[("srv-2", "localhost:3302"), ("srv-3", "localhost:3303")],
        );
        gateway.set_alias("srv-1", "router-1");
        gateway.set_alias("srv-2", "storage-1");
        gateway.set_alias("srv-3", "storage-2");
        gateway.add_unconfigured_server("localhost:3304");
        gateway
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a replica-set; members are `(uuid, uri)` pairs in failover order.
    pub fn add_replicaset(&self, uuid: &str, alias: &str, roles: &[&str], members: &[(&str, &str)]) {
        let mut inner = self.lock();
        let state = &mut inner.state;
        let mut order = Vec::with_capacity(members.len());
        for (server_uuid, uri) in members {
            state.servers.retain(|server| server.uri != *uri);
            let mut server = SimServer::unconfigured(uri);
            server.uuid = server_uuid.to_string();
            server.status = "healthy".to_string();
            server.replicaset_uuid = Some(uuid.to_string());
            state.servers.push(server);
            order.push(server_uuid.to_string());
        }
        state.replicasets.push(SimReplicaset {
            uuid: uuid.to_string(),
            alias: Some(alias.to_string()).filter(|alias| !alias.is_empty()),
            roles: roles.iter().map(|role| role.to_string()).collect(),
            vshard_group: None,
            weight: None,
            all_rw: false,
            order,
            active_master: None,
        });
    }

    /// Adds an instance that answered a probe but has not joined yet.
    pub fn add_unconfigured_server(&self, uri: &str) {
        let mut inner = self.lock();
        if inner.state.server_by_uri(uri).is_none() {
            inner.state.servers.push(SimServer::unconfigured(uri));
        }
    }

    pub fn set_alias(&self, server_uuid: &str, alias: &str) {
        if let Some(server) = self.lock().state.server_mut(server_uuid) {
            server.alias = Some(alias.to_string());
        }
    }

    pub fn set_label(&self, server_uuid: &str, name: &str, value: &str) {
        if let Some(server) = self.lock().state.server_mut(server_uuid) {
            server.labels.insert(name.to_string(), value.to_string());
        }
    }

    pub fn set_status(&self, server_uuid: &str, status: &str, message: Option<&str>) {
        if let Some(server) = self.lock().state.server_mut(server_uuid) {
            server.status = status.to_string();
            server.message = message.map(str::to_string);
        }
    }

    /// Replaces the boxinfo reported for a server; `Value::Null` reports none.
    pub fn set_boxinfo(&self, server_uuid: &str, boxinfo: Value) {
        if let Some(server) = self.lock().state.server_mut(server_uuid) {
            server.boxinfo = Some(boxinfo);
        }
    }

    pub fn set_suggestion(&self, kind: SuggestionKind, uuids: &[&str]) {
        self.lock()
            .state
            .suggestions
            .insert(kind, uuids.iter().map(|uuid| uuid.to_string()).collect());
    }

    pub fn add_issue(&self, level: &str, topic: &str, message: &str, instance_uuid: Option<&str>) {
        self.lock().state.issues.push(json!({
            "level": level,
            "topic": topic,
            "message": message,
            "instance_uuid": instance_uuid,
            "replicaset_uuid": null,
        }));
    }

    /// Overrides the raw `serverStat` entries instead of deriving them.
    pub fn set_server_stat(&self, entries: Vec<Value>) {
        self.lock().state.server_stat = Some(entries);
    }

    pub fn set_failover_mode(&self, mode: &str) {
        self.lock()
            .state
            .failover
            .insert("mode".to_string(), Value::String(mode.to_string()));
    }

    pub fn set_vshard_bootstrapped(&self, bootstrapped: bool) {
        self.lock().state.vshard_bootstrapped = bootstrapped;
    }

    /// Makes probes and joins of `uri` fail as if the instance were down.
    pub fn mark_unreachable(&self, uri: &str) {
        self.lock().state.unreachable.insert(uri.to_string());
    }

    /// Fails the next call of `operation` with `error` without touching state.
    pub fn fail_next(&self, operation: Operation, error: GatewayError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    pub fn fail_next_upload(&self, error: GatewayError) {
        self.lock().upload_failures.push_back(error);
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<GatewayRequest> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    pub fn mutation_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation.is_mutation())
            .count()
    }

    pub fn uploaded_configs(&self) -> Vec<Vec<u8>> {
        self.lock().uploads.clone()
    }

    /// Current simulated list response, as the next refresh would see it.
    pub fn list_data(&self, with_stats: bool) -> Value {
        self.lock().state.render_list(with_stats)
    }

    fn dispatch(state: &mut ClusterState, request: &GatewayRequest) -> GatewayResult<Value> {
        let variables = &request.variables;
        match request.operation {
            Operation::ServerList => {
                let with_stats = variables
                    .get("withStats")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                Ok(state.render_list(with_stats))
            }
            Operation::ServerStat => Ok(json!({ "serverStat": state.render_server_stat() })),
            Operation::ServerDetails => Ok(state.render_details(string_var(variables, "uuid")?, false)),
            Operation::ServerDetailsRefresh => {
                Ok(state.render_details(string_var(variables, "uuid")?, true))
            }
            Operation::ClusterSelf => Ok(state.render_cluster_self()),
            Operation::FailoverParams => {
                Ok(json!({ "cluster": { "failover_params": state.failover.clone() } }))
            }
            Operation::EditTopology => state.edit_topology(variables),
            Operation::ProbeServer => state.probe(string_var(variables, "uri")?),
            Operation::BootstrapVshard => state.bootstrap_vshard(),
            Operation::ChangeFailover => state.change_failover(variables),
            Operation::PromoteFailoverLeader => state.promote(variables),
            Operation::DisableServers => state.disable_servers(&uuid_list(variables)?),
            Operation::RestartReplication => {
                state.clear_suggestion(SuggestionKind::RestartReplication, &uuid_list(variables)?)?;
                Ok(json!({ "cluster": { "restart_replication": true } }))
            }
            Operation::ConfigForceReapply => {
                state.clear_suggestion(SuggestionKind::ForceApply, &uuid_list(variables)?)?;
                Ok(json!({ "cluster": { "config_force_reapply": true } }))
            }
        }
    }
}

fn string_var<'a>(variables: &'a Value, name: &str) -> GatewayResult<&'a str> {
    variables
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::query(format!("Variable \"{}\" of type String! was not provided", name)))
}

fn uuid_list(variables: &Value) -> GatewayResult<Vec<String>> {
    match variables.get("uuids") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| GatewayError::query("uuids must be strings"))
            })
            .collect(),
        _ => Err(GatewayError::query("Variable \"uuids\" was not provided")),
    }
}

#[async_trait]
impl RemoteGateway for InMemoryGateway {
    async fn execute(&self, request: GatewayRequest) -> GatewayResult<Value> {
        let mut inner = self.lock();
        inner.calls.push(request.clone());

        if let Some(error) = inner
            .failures
            .get_mut(&request.operation)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        if request.operation.is_mutation() {
            let mut draft = inner.state.clone();
            let data = Self::dispatch(&mut draft, &request)?;
            inner.state = draft;
            Ok(data)
        } else {
            Self::dispatch(&mut inner.state, &request)
        }
    }

    async fn upload_config(&self, document: Vec<u8>) -> GatewayResult<()> {
        let mut inner = self.lock();
        if let Some(error) = inner.upload_failures.pop_front() {
            return Err(error);
        }
        inner.uploads.push(document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(operation: Operation, variables: Value) -> GatewayRequest {
        GatewayRequest::new(operation, variables)
    }

    #[tokio::test]
    async fn rejected_edit_leaves_cluster_untouched() {
        let gateway = InMemoryGateway::demo();
        let before = gateway.list_data(false);

        let err = gateway
            .execute(request(
                Operation::EditTopology,
                json!({"servers": [{"uuid": "srv-2", "expelled": true}, {"uuid": "missing", "disabled": true}]}),
            ))
            .await
            .unwrap_err();

        assert!(!err.is_transport());
        assert_eq!(gateway.list_data(false), before);
    }

    #[tokio::test]
    async fn injected_failure_is_consumed_once() {
        let gateway = InMemoryGateway::demo();
        gateway.fail_next(Operation::ServerList, GatewayError::transport("connection refused"));

        let first = gateway.execute(request(Operation::ServerList, json!({}))).await;
        let second = gateway.execute(request(Operation::ServerList, json!({}))).await;

        assert!(first.unwrap_err().is_transport());
        assert!(second.is_ok());
        assert_eq!(gateway.call_count(Operation::ServerList), 2);
    }

    #[tokio::test]
    async fn probe_registers_unconfigured_server() {
        let gateway = InMemoryGateway::new();
        gateway.mark_unreachable("localhost:3399");

        let ok = gateway
            .execute(request(Operation::ProbeServer, json!({"uri": "localhost:3310"})))
            .await
            .unwrap();
        assert_eq!(ok["probe_server"], true);

        let down = gateway
            .execute(request(Operation::ProbeServer, json!({"uri": "localhost:3399"})))
            .await;
        assert!(down.is_err());

        let list = gateway.list_data(false);
        let servers = list["serverList"].as_array().unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0]["uuid"], "");
        assert_eq!(servers[0]["status"], "unconfigured");
    }
}
