#[derive(Debug, Deserialize)]
struct EditServerInput {
    uuid: String,
    #[serde(default)]
    disabled: Option<bool>,
    #[serde(default)]
    expelled: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct JoinServerInput {
    uri: String,
    #[serde(default)]
    uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EditReplicasetInput {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    all_rw: Option<bool>,
    #[serde(default)]
    vshard_group: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    failover_priority: Option<Vec<String>>,
    #[serde(default)]
    join_servers: Option<Vec<JoinServerInput>>,
}

#[derive(Debug, Default, Deserialize)]
struct EditTopologyInput {
    #[serde(default)]
    servers: Option<Vec<EditServerInput>>,
    #[serde(default)]
    replicasets: Option<Vec<EditReplicasetInput>>,
}

fn not_in_config(uuid: &str) -> GatewayError {
    GatewayError::query(format!("Server \"{}\" not in clusterwide config", uuid))
}

impl ClusterState {
    /// Applies an edit to this state. Callers run it on a draft and only
    /// commit the draft when the whole edit succeeded.
    fn edit_topology(&mut self, variables: &Value) -> GatewayResult<Value> {
        let input = EditTopologyInput::deserialize(variables)
            .map_err(|e| GatewayError::query(format!("Invalid edit_topology arguments: {}", e)))?;
        let mut touched_servers = Vec::new();
        let mut touched_replicasets = Vec::new();

        let mut seen = HashSet::new();
        for patch in input.servers.unwrap_or_default() {
            if !seen.insert(patch.uuid.clone()) {
                return Err(GatewayError::query(format!(
                    "Duplicate key \"{}\" in servers",
                    patch.uuid
                )));
            }
            self.apply_server_patch(&patch)?;
            if patch.expelled != Some(true) {
                touched_servers.push(patch.uuid);
            }
        }

        for patch in input.replicasets.unwrap_or_default() {
            let (uuid, joined) = self.apply_replicaset_patch(patch)?;
            touched_servers.extend(joined);
            touched_replicasets.push(uuid);
        }

        Ok(json!({
            "cluster": {
                "edit_topology": {
                    "servers": touched_servers
                        .iter()
                        .map(|uuid| json!({ "uuid": uuid }))
                        .collect::<Vec<_>>(),
                    "replicasets": touched_replicasets
                        .iter()
                        .map(|uuid| json!({ "uuid": uuid }))
                        .collect::<Vec<_>>(),
                }
            }
        }))
    }

    fn apply_server_patch(&mut self, patch: &EditServerInput) -> GatewayResult<()> {
        let server = self
            .server_mut(&patch.uuid)
            .ok_or_else(|| not_in_config(&patch.uuid))?;
        if let Some(disabled) = patch.disabled {
            server.disabled = disabled;
        }
        if patch.expelled == Some(true) {
            let replicaset_uuid = server.replicaset_uuid.clone();
            self.servers.retain(|server| server.uuid != patch.uuid);
            if let Some(replicaset_uuid) = replicaset_uuid {
                if let Some(replicaset) = self.replicaset_mut(&replicaset_uuid) {
                    replicaset.order.retain(|uuid| *uuid != patch.uuid);
                    if replicaset.active_master.as_deref() == Some(patch.uuid.as_str()) {
                        replicaset.active_master = None;
                    }
                }
                self.replicasets
                    .retain(|replicaset| !replicaset.order.is_empty());
            }
            self.forget_server(&patch.uuid);
        }
        Ok(())
    }

    fn apply_replicaset_patch(
        &mut self,
        patch: EditReplicasetInput,
    ) -> GatewayResult<(String, Vec<String>)> {
        let uuid = match patch.uuid {
            Some(uuid) => {
                if self.replicaset(&uuid).is_none() {
                    return Err(GatewayError::query(format!(
                        "Replicaset \"{}\" not in clusterwide config",
                        uuid
                    )));
                }
                uuid
            }
            None => {
                if patch.join_servers.as_ref().is_none_or(Vec::is_empty) {
                    return Err(GatewayError::query(
                        "Replicaset must have at least one server to join",
                    ));
                }
                let uuid = Uuid::new_v4().to_string();
                self.replicasets.push(SimReplicaset {
                    uuid: uuid.clone(),
                    alias: None,
                    roles: Vec::new(),
                    vshard_group: None,
                    weight: None,
                    all_rw: false,
                    order: Vec::new(),
                    active_master: None,
                });
                uuid
            }
        };

        let mut joined = Vec::new();
        for join in patch.join_servers.unwrap_or_default() {
            joined.push(self.join_server(&uuid, join)?);
        }

        let replicaset = self
            .replicaset_mut(&uuid)
            .ok_or_else(|| GatewayError::query(format!("Replicaset \"{}\" vanished", uuid)))?;
        if let Some(alias) = patch.alias {
            replicaset.alias = Some(alias).filter(|alias| !alias.is_empty());
        }
        if let Some(roles) = patch.roles {
            replicaset.roles = roles;
        }
        if let Some(all_rw) = patch.all_rw {
            replicaset.all_rw = all_rw;
        }
        if let Some(vshard_group) = patch.vshard_group {
            replicaset.vshard_group = Some(vshard_group);
        }
        if let Some(weight) = patch.weight {
            replicaset.weight = Some(weight);
        }
        if let Some(priority) = patch.failover_priority {
            for member in &priority {
                if !replicaset.order.contains(member) {
                    return Err(GatewayError::query(format!(
                        "Server \"{}\" is not a member of replicaset \"{}\"",
                        member, uuid
                    )));
                }
            }
            let rest: Vec<String> = replicaset
                .order
                .iter()
                .filter(|member| !priority.contains(member))
                .cloned()
                .collect();
            replicaset.order = priority.into_iter().chain(rest).collect();
        }

        Ok((uuid, joined))
    }

    fn join_server(&mut self, replicaset_uuid: &str, join: JoinServerInput) -> GatewayResult<String> {
        if self.unreachable.contains(&join.uri) {
            return Err(GatewayError::query(format!(
                "Probe \"{}\" failed: no response",
                join.uri
            )));
        }
        if let Some(existing) = self.server_by_uri(&join.uri) {
            if existing.is_configured() {
                return Err(GatewayError::query(format!(
                    "Server \"{}\" is already joined",
                    join.uri
                )));
            }
        }

        let uuid = join.uuid.unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.server(&uuid).is_some() {
            return Err(GatewayError::query(format!("Duplicate server uuid \"{}\"", uuid)));
        }
        self.servers.retain(|server| server.uri != join.uri);
        let mut server = SimServer::unconfigured(&join.uri);
        server.uuid = uuid.clone();
        server.status = "healthy".to_string();
        server.replicaset_uuid = Some(replicaset_uuid.to_string());
        self.servers.push(server);

        if let Some(replicaset) = self.replicaset_mut(replicaset_uuid) {
            replicaset.order.push(uuid.clone());
        }
        Ok(uuid)
    }

    fn probe(&mut self, uri: &str) -> GatewayResult<Value> {
        if self.unreachable.contains(uri) {
            return Err(GatewayError::query(format!(
                "Probe \"{}\" failed: ping was not sent",
                uri
            )));
        }
        if self.server_by_uri(uri).is_none() {
            self.servers.push(SimServer::unconfigured(uri));
        }
        Ok(json!({ "probe_server": true }))
    }

    fn bootstrap_vshard(&mut self) -> GatewayResult<Value> {
        if self.vshard_bootstrapped {
            return Err(GatewayError::query("Sharding config is already applied"));
        }
        if !self.replicasets.iter().any(SimReplicaset::is_storage) {
            return Err(GatewayError::query(
                "Sharding config is empty. Maybe you have no storages yet?",
            ));
        }
        self.vshard_bootstrapped = true;
        Ok(json!({ "bootstrap_vshard": true }))
    }

    fn change_failover(&mut self, variables: &Value) -> GatewayResult<Value> {
        let Value::Object(params) = variables else {
            return Err(GatewayError::query("failover_params expects an object"));
        };
        if let Some(mode) = params.get("mode").and_then(Value::as_str) {
            if !matches!(mode, "disabled" | "eventual" | "stateful" | "raft") {
                return Err(GatewayError::query(format!("Unknown failover mode \"{}\"", mode)));
            }
            if mode == "stateful"
                && params
                    .get("state_provider")
                    .or_else(|| self.failover.get("state_provider"))
                    .is_none_or(Value::is_null)
            {
                return Err(GatewayError::query(
                    "topology_new.failover missing state_provider for mode \"stateful\"",
                ));
            }
        }
        for (key, value) in params {
            if !value.is_null() {
                self.failover.insert(key.clone(), value.clone());
            }
        }
        Ok(json!({ "cluster": { "failover_params": { "mode": self.failover_mode() } } }))
    }

    fn promote(&mut self, variables: &Value) -> GatewayResult<Value> {
        let replicaset_uuid = string_var(variables, "replicaset_uuid")?;
        let instance_uuid = string_var(variables, "instance_uuid")?;
        if !matches!(self.failover_mode(), "stateful" | "raft") {
            return Err(GatewayError::query(
                "Promotion only works with stateful failover",
            ));
        }
        let replicaset = self.replicaset_mut(replicaset_uuid).ok_or_else(|| {
            GatewayError::query(format!("Replicaset \"{}\" does not exist", replicaset_uuid))
        })?;
        if !replicaset.order.iter().any(|uuid| uuid == instance_uuid) {
            return Err(GatewayError::query(format!(
                "Server \"{}\" is not a member of replicaset \"{}\"",
                instance_uuid, replicaset_uuid
            )));
        }
        replicaset.active_master = Some(instance_uuid.to_string());
        Ok(json!({ "cluster": { "failover_promote": true } }))
    }

    fn disable_servers(&mut self, uuids: &[String]) -> GatewayResult<Value> {
        let mut disabled = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            let server = self.server_mut(uuid).ok_or_else(|| not_in_config(uuid))?;
            server.disabled = true;
            disabled.push(json!({ "uuid": uuid, "disabled": true }));
        }
        self.clear_suggestion(SuggestionKind::DisableServers, uuids)?;
        Ok(json!({ "cluster": { "disable_servers": disabled } }))
    }
}
