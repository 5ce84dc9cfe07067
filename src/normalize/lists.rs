use super::stats::filter_server_stat;
use super::wire::{RawIssue, RawLabel, RawListResponse, RawReplicaset, RawServer, RawSuggestions, RawUuidRef};
use crate::core::{
    AdminError, Boxinfo, Issue, Replicaset, Result, Server, ServerStatus, Suggestion,
    SuggestionKind, TopologySnapshot,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Reads `boxinfo.general.ro`; anything short of a boolean there is unknown.
pub fn read_only_flag(boxinfo: Option<&Boxinfo>) -> Option<bool> {
    boxinfo?.get("general")?.get("ro")?.as_bool()
}

pub(crate) fn labels_to_map(labels: Option<Vec<RawLabel>>) -> BTreeMap<String, String> {
    labels
        .unwrap_or_default()
        .into_iter()
        .map(|label| (label.name, label.value.unwrap_or_default()))
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn uuid_of(reference: Option<RawUuidRef>) -> Option<String> {
    non_empty(reference.and_then(|r| r.uuid))
}

/// Normalizes one raw server record.
///
/// `uri` and the `uuid` key are required; the uuid may only be empty for a
/// server that is not a replica-set member.
pub(crate) fn normalize_server(raw: RawServer) -> Result<Server> {
    let uri = non_empty(raw.uri).ok_or_else(|| {
        AdminError::MalformedResponse("server record has no uri".to_string())
    })?;
    let uuid = raw.uuid.ok_or_else(|| {
        AdminError::MalformedResponse(format!("server '{}' has no uuid field", uri))
    })?;
    let replicaset_uuid = uuid_of(raw.replicaset);
    if uuid.is_empty() && replicaset_uuid.is_some() {
        return Err(AdminError::MalformedResponse(format!(
            "server '{}' belongs to a replicaset but has an empty uuid",
            uri
        )));
    }

    let ro = read_only_flag(raw.boxinfo.as_ref());
    let status = match raw.status {
        Some(status) => ServerStatus::from(status),
        None if replicaset_uuid.is_none() => ServerStatus::Unconfigured,
        None => ServerStatus::Other("unknown".to_string()),
    };

    Ok(Server {
        uuid,
        uri,
        alias: non_empty(raw.alias),
        labels: labels_to_map(raw.labels),
        status,
        message: non_empty(raw.message),
        disabled: raw.disabled.unwrap_or(false),
        priority: raw.priority,
        boxinfo: raw.boxinfo.unwrap_or_default(),
        ro,
        replicaset_uuid,
    })
}

/// Normalizes one raw replica-set record together with its members.
pub(crate) fn normalize_replicaset(raw: RawReplicaset) -> Result<Replicaset> {
    let uuid = non_empty(raw.uuid).ok_or_else(|| {
        AdminError::MalformedResponse("replicaset record has no uuid".to_string())
    })?;
    let raw_servers = raw.servers.unwrap_or_default();
    if raw_servers.is_empty() {
        return Err(AdminError::MalformedResponse(format!(
            "replicaset '{}' has no members",
            uuid
        )));
    }

    let mut seen = HashSet::new();
    let mut servers = Vec::with_capacity(raw_servers.len());
    for raw_server in raw_servers {
        let mut server = normalize_server(raw_server)?;
        if server.uuid.is_empty() {
            return Err(AdminError::MalformedResponse(format!(
                "member '{}' of replicaset '{}' has an empty uuid",
                server.uri, uuid
            )));
        }
        match server.replicaset_uuid.as_deref() {
            Some(owner) if owner != uuid => {
                return Err(AdminError::MalformedResponse(format!(
                    "member '{}' of replicaset '{}' claims replicaset '{}'",
                    server.uuid, uuid, owner
                )));
            }
            Some(_) => {}
            None => server.replicaset_uuid = Some(uuid.clone()),
        }
        if !seen.insert(server.uuid.clone()) {
            return Err(AdminError::MalformedResponse(format!(
                "server '{}' is listed twice in replicaset '{}'",
                server.uuid, uuid
            )));
        }
        servers.push(server);
    }

    // Members without a priority keep their relative order after the ranked ones.
    servers.sort_by_key(|server| server.priority.unwrap_or(u32::MAX));
    let failover_priority = servers.iter().map(|server| server.uuid.clone()).collect();

    Ok(Replicaset {
        uuid,
        alias: non_empty(raw.alias),
        status: non_empty(raw.status),
        roles: raw.roles.unwrap_or_default(),
        vshard_group: non_empty(raw.vshard_group),
        weight: raw.weight,
        all_rw: raw.all_rw.unwrap_or(false),
        master_uuid: uuid_of(raw.master),
        active_master_uuid: uuid_of(raw.active_master),
        failover_priority,
        servers,
    })
}

fn normalize_issue(raw: RawIssue) -> Issue {
    Issue {
        level: raw.level.unwrap_or_else(|| "warning".to_string()),
        topic: non_empty(raw.topic),
        message: raw.message.unwrap_or_default(),
        instance_uuid: non_empty(raw.instance_uuid),
        replicaset_uuid: non_empty(raw.replicaset_uuid),
    }
}

pub(crate) fn normalize_suggestions(raw: Option<RawSuggestions>) -> Vec<Suggestion> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut by_kind: HashMap<SuggestionKind, Option<Vec<RawUuidRef>>> = HashMap::from([
        (SuggestionKind::RestartReplication, raw.restart_replication),
        (SuggestionKind::ForceApply, raw.force_apply),
        (SuggestionKind::DisableServers, raw.disable_servers),
        (SuggestionKind::RefineUri, raw.refine_uri),
    ]);

    SuggestionKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let refs = by_kind.remove(&kind).flatten()?;
            let mut seen = HashSet::new();
            let targets: Vec<String> = refs
                .into_iter()
                .filter_map(|r| non_empty(r.uuid))
                .filter(|uuid| seen.insert(uuid.clone()))
                .collect();
            (!targets.is_empty()).then_some(Suggestion { kind, targets })
        })
        .collect()
}

/// Converts a list-query `data` object into a snapshot.
///
/// Fails with `MalformedResponse` instead of returning partially populated
/// entities; callers keep their previous snapshot in that case.
pub fn normalize_lists(data: Value, with_stats: bool) -> Result<TopologySnapshot> {
    let raw: RawListResponse = serde_json::from_value(data)
        .map_err(|e| AdminError::MalformedResponse(format!("list response: {}", e)))?;

    let raw_servers = raw.server_list.ok_or_else(|| {
        AdminError::MalformedResponse("list response has no serverList".to_string())
    })?;
    let raw_replicasets = raw.replicaset_list.ok_or_else(|| {
        AdminError::MalformedResponse("list response has no replicasetList".to_string())
    })?;

    let servers = raw_servers
        .into_iter()
        .map(normalize_server)
        .collect::<Result<Vec<_>>>()?;
    let replicasets = raw_replicasets
        .into_iter()
        .map(normalize_replicaset)
        .collect::<Result<Vec<_>>>()?;

    let mut owner_by_server: HashMap<&str, &str> = HashMap::new();
    for replicaset in &replicasets {
        for member in &replicaset.servers {
            if let Some(previous) = owner_by_server.insert(member.uuid.as_str(), replicaset.uuid.as_str()) {
                return Err(AdminError::MalformedResponse(format!(
                    "server '{}' is a member of both '{}' and '{}'",
                    member.uuid, previous, replicaset.uuid
                )));
            }
        }
    }

    let cluster = raw.cluster.unwrap_or_default();
    let issues = cluster
        .issues
        .unwrap_or_default()
        .into_iter()
        .map(normalize_issue)
        .collect();
    let suggestions = normalize_suggestions(cluster.suggestions);

    let server_stat = with_stats.then(|| filter_server_stat(raw.server_stat.unwrap_or_default()));

    Ok(TopologySnapshot {
        servers,
        replicasets,
        issues,
        suggestions,
        server_stat,
        fetched_at: Some(Utc::now()),
    })
}
