/// One instance of the simulated cluster.
#[derive(Debug, Clone, PartialEq)]
struct SimServer {
    /// Empty until the instance joins a replica-set.
    uuid: String,
    uri: String,
    alias: Option<String>,
    status: String,
    message: Option<String>,
    disabled: bool,
    labels: BTreeMap<String, String>,
    /// Explicit boxinfo override; derived from membership when unset.
    boxinfo: Option<Value>,
    replicaset_uuid: Option<String>,
}

impl SimServer {
    fn unconfigured(uri: &str) -> Self {
        Self {
            uuid: String::new(),
            uri: uri.to_string(),
            alias: None,
            status: "unconfigured".to_string(),
            message: None,
            disabled: false,
            labels: BTreeMap::new(),
            boxinfo: None,
            replicaset_uuid: None,
        }
    }

    fn is_configured(&self) -> bool {
        !self.uuid.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SimReplicaset {
    uuid: String,
    alias: Option<String>,
    roles: Vec<String>,
    vshard_group: Option<String>,
    weight: Option<f64>,
    all_rw: bool,
    /// Member uuids in failover priority order; the first one is the master.
    order: Vec<String>,
    active_master: Option<String>,
}

impl SimReplicaset {
    fn master(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    fn leader(&self) -> Option<&str> {
        self.active_master.as_deref().or_else(|| self.master())
    }

    fn is_storage(&self) -> bool {
        self.roles.iter().any(|role| role == "vshard-storage")
    }
}

#[derive(Debug, Clone)]
struct ClusterState {
    servers: Vec<SimServer>,
    replicasets: Vec<SimReplicaset>,
    issues: Vec<Value>,
    suggestions: HashMap<SuggestionKind, Vec<String>>,
    failover: Map<String, Value>,
    server_stat: Option<Vec<Value>>,
    vshard_bootstrapped: bool,
    unreachable: HashSet<String>,
}

impl Default for ClusterState {
    fn default() -> Self {
        let failover = json!({
            "mode": "disabled",
            "state_provider": null,
            "failover_timeout": 20,
            "fencing_enabled": false,
            "fencing_timeout": 10,
            "fencing_pause": 2,
            "tarantool_params": null,
            "etcd2_params": null,
        });
        Self {
            servers: Vec::new(),
            replicasets: Vec::new(),
            issues: Vec::new(),
            suggestions: HashMap::new(),
            failover: match failover {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            server_stat: None,
            vshard_bootstrapped: false,
            unreachable: HashSet::new(),
        }
    }
}

impl ClusterState {
    fn server(&self, uuid: &str) -> Option<&SimServer> {
        if uuid.is_empty() {
            return None;
        }
        self.servers.iter().find(|server| server.uuid == uuid)
    }

    fn server_mut(&mut self, uuid: &str) -> Option<&mut SimServer> {
        if uuid.is_empty() {
            return None;
        }
        self.servers.iter_mut().find(|server| server.uuid == uuid)
    }

    fn server_by_uri(&self, uri: &str) -> Option<&SimServer> {
        self.servers.iter().find(|server| server.uri == uri)
    }

    fn replicaset(&self, uuid: &str) -> Option<&SimReplicaset> {
        self.replicasets.iter().find(|replicaset| replicaset.uuid == uuid)
    }

    fn replicaset_mut(&mut self, uuid: &str) -> Option<&mut SimReplicaset> {
        self.replicasets
            .iter_mut()
            .find(|replicaset| replicaset.uuid == uuid)
    }

    fn members(&self, replicaset: &SimReplicaset) -> Vec<&SimServer> {
        replicaset
            .order
            .iter()
            .filter_map(|uuid| self.server(uuid))
            .collect()
    }

    fn failover_mode(&self) -> &str {
        self.failover
            .get("mode")
            .and_then(Value::as_str)
            .unwrap_or("disabled")
    }

    /// Drops `uuids` from the suggestion of `kind`; every uuid must be a known server.
    fn clear_suggestion(&mut self, kind: SuggestionKind, uuids: &[String]) -> GatewayResult<()> {
        for uuid in uuids {
            if self.server(uuid).is_none() {
                return Err(GatewayError::query(format!(
                    "Server \"{}\" not in clusterwide config",
                    uuid
                )));
            }
        }
        if let Some(targets) = self.suggestions.get_mut(&kind) {
            targets.retain(|target| !uuids.contains(target));
            if targets.is_empty() {
                self.suggestions.remove(&kind);
            }
        }
        Ok(())
    }

    fn forget_server(&mut self, uuid: &str) {
        for targets in self.suggestions.values_mut() {
            targets.retain(|target| target != uuid);
        }
        self.suggestions.retain(|_, targets| !targets.is_empty());
    }
}
