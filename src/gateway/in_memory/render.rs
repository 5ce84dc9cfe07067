const DEFAULT_BUCKET_COUNT: u64 = 3000;

impl ClusterState {
    fn render_boxinfo(&self, server: &SimServer) -> Value {
        if let Some(boxinfo) = &server.boxinfo {
            return boxinfo.clone();
        }
        let Some(replicaset) = server
            .replicaset_uuid
            .as_deref()
            .and_then(|uuid| self.replicaset(uuid))
        else {
            return Value::Null;
        };
        let is_leader = replicaset.leader() == Some(server.uuid.as_str());
        json!({
            "general": {
                "ro": !(is_leader || replicaset.all_rw),
                "instance_uuid": server.uuid,
                "replicaset_uuid": replicaset.uuid,
                "pid": 1000 + self.servers.iter().position(|s| s.uuid == server.uuid).unwrap_or(0),
            },
            "cartridge": { "state": "RolesConfigured", "error": null },
        })
    }

    fn render_server(&self, server: &SimServer) -> Value {
        let replicaset = server
            .replicaset_uuid
            .as_deref()
            .and_then(|uuid| self.replicaset(uuid));
        let priority = replicaset
            .and_then(|replicaset| replicaset.order.iter().position(|uuid| *uuid == server.uuid))
            .map(|index| index + 1);
        let labels: Vec<Value> = server
            .labels
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();

        json!({
            "uuid": server.uuid,
            "uri": server.uri,
            "alias": server.alias,
            "status": server.status,
            "message": server.message.clone().unwrap_or_default(),
            "disabled": server.disabled,
            "priority": priority,
            "replicaset": replicaset.map(|replicaset| json!({ "uuid": replicaset.uuid })),
            "labels": labels,
            "boxinfo": self.render_boxinfo(server),
        })
    }

    fn render_replicaset(&self, replicaset: &SimReplicaset) -> Value {
        let members = self.members(replicaset);
        let status = if members.iter().all(|member| member.status == "healthy") {
            "healthy"
        } else {
            "unhealthy"
        };
        json!({
            "uuid": replicaset.uuid,
            "alias": replicaset.alias,
            "status": status,
            "roles": replicaset.roles,
            "vshard_group": replicaset.vshard_group,
            "weight": replicaset.weight,
            "all_rw": replicaset.all_rw,
            "master": replicaset.master().map(|uuid| json!({ "uuid": uuid })),
            "active_master": replicaset.leader().map(|uuid| json!({ "uuid": uuid })),
            "servers": members
                .into_iter()
                .map(|member| self.render_server(member))
                .collect::<Vec<_>>(),
        })
    }

    fn render_suggestions(&self) -> Value {
        let mut suggestions = Map::new();
        for kind in SuggestionKind::ALL {
            let value = match self.suggestions.get(&kind) {
                Some(targets) if !targets.is_empty() => Value::Array(
                    targets
                        .iter()
                        .map(|uuid| json!({ "uuid": uuid }))
                        .collect(),
                ),
                _ => Value::Null,
            };
            suggestions.insert(kind.as_str().to_string(), value);
        }
        Value::Object(suggestions)
    }

    /// Raw `serverStat` entries. Instances that are not configured report
    /// positional (empty sequence) statistics, like the real backend does.
    fn render_server_stat(&self) -> Vec<Value> {
        if let Some(entries) = &self.server_stat {
            return entries.clone();
        }
        self.servers
            .iter()
            .map(|server| {
                if server.is_configured() {
                    json!({
                        "uuid": server.uuid,
                        "uri": server.uri,
                        "statistics": {
                            "quota_size": 268_435_456u64,
                            "arena_used": 4_194_304u64,
                            "items_used": 1_048_576u64,
                            "quota_used_ratio": "1.56%",
                            "arena_used_ratio": "12.50%",
                            "items_used_ratio": "25.00%",
                        },
                    })
                } else {
                    json!({ "uuid": server.uuid, "uri": server.uri, "statistics": [] })
                }
            })
            .collect()
    }

    fn render_list(&self, with_stats: bool) -> Value {
        let mut data = json!({
            "serverList": self
                .servers
                .iter()
                .map(|server| self.render_server(server))
                .collect::<Vec<_>>(),
            "replicasetList": self
                .replicasets
                .iter()
                .map(|replicaset| self.render_replicaset(replicaset))
                .collect::<Vec<_>>(),
            "cluster": {
                "suggestions": self.render_suggestions(),
                "issues": self.issues,
            },
        });
        if with_stats {
            data["serverStat"] = Value::Array(self.render_server_stat());
        }
        data
    }

    /// Detail view for a server. An unknown uuid yields an empty `servers` list.
    fn render_details(&self, uuid: &str, refresh: bool) -> Value {
        let Some(server) = self.server(uuid) else {
            return json!({ "servers": [] });
        };
        let boxinfo = self.render_boxinfo(server);
        let labels: Vec<Value> = server
            .labels
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();

        if refresh {
            return json!({ "servers": [{ "labels": labels, "boxinfo": boxinfo }] });
        }

        let replicaset = server
            .replicaset_uuid
            .as_deref()
            .and_then(|uuid| self.replicaset(uuid));
        json!({
            "servers": [{
                "alias": server.alias,
                "uri": server.uri,
                "status": server.status,
                "message": server.message.clone().unwrap_or_default(),
                "labels": labels,
                "boxinfo": boxinfo,
                "replicaset": replicaset.map(|replicaset| json!({
                    "roles": replicaset.roles,
                    "master": replicaset.master().map(|uuid| json!({ "uuid": uuid })),
                    "active_master": replicaset.leader().map(|uuid| json!({ "uuid": uuid })),
                })),
            }],
            "descriptionCartridge": { "fields": [
                { "name": "state", "description": "Current instance state" },
                { "name": "error", "description": "Error details if instance is in failure state" },
            ]},
            "descriptionGeneral": { "fields": [
                { "name": "ro", "description": "Current read-only state" },
                { "name": "instance_uuid", "description": "A globally unique identifier of the instance" },
                { "name": "replicaset_uuid", "description": "The UUID of the replica set" },
                { "name": "pid", "description": "A process ID" },
            ]},
            "descriptionNetwork": { "fields": [] },
            "descriptionReplication": { "fields": [] },
            "descriptionStorage": { "fields": [] },
        })
    }

    fn render_cluster_self(&self) -> Value {
        let first = self.servers.first();
        let has_storage = self.replicasets.iter().any(SimReplicaset::is_storage);
        json!({
            "cluster": {
                "self": {
                    "uri": first.map(|server| server.uri.clone()),
                    "uuid": first.map(|server| server.uuid.clone()).filter(|uuid| !uuid.is_empty()),
                    "alias": first.and_then(|server| server.alias.clone()),
                    "demo_uri": null,
                    "state": if self.replicasets.is_empty() { "Unconfigured" } else { "RolesConfigured" },
                    "error": null,
                },
                "failover_params": self.failover,
                "known_roles": [
                    { "name": "failover-coordinator", "dependencies": [], "implies_router": false, "implies_storage": false },
                    { "name": "vshard-storage", "dependencies": [], "implies_router": false, "implies_storage": true },
                    { "name": "vshard-router", "dependencies": [], "implies_router": true, "implies_storage": false },
                ],
                "vshard_groups": [
                    { "name": "default", "bucket_count": DEFAULT_BUCKET_COUNT, "bootstrapped": self.vshard_bootstrapped },
                ],
                "can_bootstrap_vshard": has_storage && !self.vshard_bootstrapped,
                "vshard_bucket_count": DEFAULT_BUCKET_COUNT,
            }
        })
    }
}
