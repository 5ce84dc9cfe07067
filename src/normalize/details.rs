use super::lists::labels_to_map;
use super::wire::{RawDetailsResponse, RawTypeDescription, RawUuidRef};
use crate::core::{
    AdminError, BoxinfoDescriptions, Result, ServerDetails, ServerDetailsRefresh, ServerStatus,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Reduces a `{fields: [{name, description}]}` catalog to a name → description map.
pub(crate) fn descriptions_by_name(catalog: Option<RawTypeDescription>) -> BTreeMap<String, String> {
    catalog
        .and_then(|catalog| catalog.fields)
        .unwrap_or_default()
        .into_iter()
        .map(|field| (field.name, field.description.unwrap_or_default()))
        .collect()
}

fn uuid_of(reference: Option<RawUuidRef>) -> Option<String> {
    reference.and_then(|r| r.uuid).filter(|uuid| !uuid.is_empty())
}

fn parse(data: Value) -> Result<RawDetailsResponse> {
    RawDetailsResponse::deserialize(data)
        .map_err(|e| AdminError::MalformedResponse(format!("server details response: {}", e)))
}

/// Normalizes the server detail query for the server `uuid`.
pub fn normalize_server_details(uuid: &str, data: Value) -> Result<ServerDetails> {
    let mut raw = parse(data)?;
    let server = raw
        .servers
        .take()
        .and_then(|servers| servers.into_iter().next())
        .ok_or_else(|| {
            AdminError::MalformedResponse(format!("no details returned for server '{}'", uuid))
        })?;
    let uri = server.uri.filter(|uri| !uri.is_empty()).ok_or_else(|| {
        AdminError::MalformedResponse(format!("details of server '{}' have no uri", uuid))
    })?;
    let replicaset = server.replicaset.unwrap_or_default();

    Ok(ServerDetails {
        uuid: uuid.to_string(),
        alias: server.alias.filter(|alias| !alias.is_empty()),
        uri,
        status: server
            .status
            .map(ServerStatus::from)
            .unwrap_or_default(),
        message: server.message.filter(|message| !message.is_empty()),
        labels: labels_to_map(server.labels),
        boxinfo: server.boxinfo.unwrap_or_default(),
        roles: replicaset.roles.unwrap_or_default(),
        master_uuid: uuid_of(replicaset.master),
        active_master_uuid: uuid_of(replicaset.active_master),
        descriptions: BoxinfoDescriptions {
            cartridge: descriptions_by_name(raw.description_cartridge),
            general: descriptions_by_name(raw.description_general),
            network: descriptions_by_name(raw.description_network),
            replication: descriptions_by_name(raw.description_replication),
            storage: descriptions_by_name(raw.description_storage),
        },
    })
}

/// Normalizes the lighter re-poll of an open detail view.
pub fn normalize_server_details_refresh(uuid: &str, data: Value) -> Result<ServerDetailsRefresh> {
    let raw = parse(data)?;
    let server = raw
        .servers
        .and_then(|servers| servers.into_iter().next())
        .ok_or_else(|| {
            AdminError::MalformedResponse(format!("no details returned for server '{}'", uuid))
        })?;

    Ok(ServerDetailsRefresh {
        boxinfo: server.boxinfo.unwrap_or_default(),
        labels: labels_to_map(server.labels),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptions_reduce_to_maps() {
        let details = normalize_server_details(
            "s1",
            json!({
                "servers": [{
                    "alias": "storage-1",
                    "uri": "localhost:3302",
                    "status": "healthy",
                    "labels": [{"name": "dc", "value": "msk"}],
                    "boxinfo": {"general": {"ro": true}},
                    "replicaset": {
                        "roles": ["vshard-storage"],
                        "master": {"uuid": "s1"},
                        "active_master": {"uuid": "s2"}
                    }
                }],
                "descriptionGeneral": {"fields": [
                    {"name": "ro", "description": "Current read-only state"},
                    {"name": "pid", "description": null}
                ]},
                "descriptionStorage": null
            }),
        )
        .unwrap();

        assert_eq!(details.alias.as_deref(), Some("storage-1"));
        assert_eq!(details.labels["dc"], "msk");
        assert_eq!(details.master_uuid.as_deref(), Some("s1"));
        assert_eq!(details.active_master_uuid.as_deref(), Some("s2"));
        assert_eq!(details.descriptions.general["ro"], "Current read-only state");
        assert_eq!(details.descriptions.general["pid"], "");
        assert!(details.descriptions.storage.is_empty());
    }

    #[test]
    fn unconfigured_server_details_have_no_masters() {
        let details = normalize_server_details(
            "",
            json!({"servers": [{"uri": "localhost:3310", "status": "unconfigured", "boxinfo": null}]}),
        )
        .unwrap();
        assert!(details.master_uuid.is_none());
        assert!(details.roles.is_empty());
        assert!(details.boxinfo.is_empty());
    }

    #[test]
    fn refresh_defaults_missing_boxinfo_to_empty() {
        let refresh =
            normalize_server_details_refresh("s1", json!({"servers": [{"labels": null}]})).unwrap();
        assert!(refresh.boxinfo.is_empty());
        assert!(refresh.labels.is_empty());

        assert!(normalize_server_details_refresh("s1", json!({"servers": []})).is_err());
    }
}
