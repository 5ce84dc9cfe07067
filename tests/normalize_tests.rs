use cartridge_admin::normalize::{filter_server_stat, normalize_lists};
use cartridge_admin::{AdminError, ServerStatus, SuggestionKind};
use serde_json::{Value, json};

fn list_response() -> Value {
    json!({
        "serverList": [
            {
                "uuid": "srv1", "uri": "1.2.3.4:3301", "alias": "storage-1",
                "status": "healthy", "message": "", "disabled": false, "priority": 1,
                "replicaset": {"uuid": "rs1"},
                "labels": [{"name": "dc", "value": "msk"}],
                "boxinfo": {"general": {"ro": false}}
            },
            {
                "uuid": "srv2", "uri": "1.2.3.4:3302", "alias": "storage-2",
                "status": "unreachable", "message": "Connection refused", "disabled": false, "priority": 2,
                "replicaset": {"uuid": "rs1"},
                "labels": [],
                "boxinfo": {"network": {"readahead": 16320}}
            },
            {
                "uuid": "", "uri": "1.2.3.4:3310", "alias": null,
                "status": "unconfigured", "message": "", "disabled": false, "priority": null,
                "replicaset": null, "labels": null, "boxinfo": null
            }
        ],
        "replicasetList": [
            {
                "uuid": "rs1", "alias": "storage", "status": "unhealthy",
                "roles": ["vshard-storage"], "vshard_group": "default", "weight": 1.0, "all_rw": false,
                "master": {"uuid": "srv1"}, "active_master": {"uuid": "srv1"},
                "servers": [
                    {"uuid": "srv2", "uri": "1.2.3.4:3302", "alias": "storage-2", "priority": 2,
                     "replicaset": {"uuid": "rs1"}, "status": "unreachable", "boxinfo": null},
                    {"uuid": "srv1", "uri": "1.2.3.4:3301", "alias": "storage-1", "priority": 1,
                     "replicaset": {"uuid": "rs1"}, "status": "healthy",
                     "boxinfo": {"general": {"ro": false}}}
                ]
            }
        ],
        "serverStat": [
            {"uuid": "srv1", "uri": "1.2.3.4:3301", "statistics": {"quota_size": 1024, "arena_used": 10}},
            {"uuid": "srv2", "uri": "1.2.3.4:3302", "statistics": []},
            {"uuid": "", "uri": "1.2.3.4:3310", "statistics": []}
        ],
        "cluster": {
            "suggestions": {
                "restart_replication": [{"uuid": "srv2"}],
                "force_apply": null,
                "disable_servers": [],
                "refine_uri": null
            },
            "issues": [
                {"level": "warning", "topic": "replication", "message": "Replication from srv1 to srv2 is stopped",
                 "instance_uuid": "srv2", "replicaset_uuid": "rs1"}
            ]
        }
    })
}

#[test]
fn test_list_is_normalized() {
    let snapshot = normalize_lists(list_response(), true).unwrap();

    assert_eq!(snapshot.servers.len(), 3);
    let srv1 = snapshot.server("srv1").unwrap();
    assert_eq!(srv1.ro, Some(false));
    assert_eq!(srv1.labels.get("dc").map(String::as_str), Some("msk"));
    assert_eq!(srv1.display_label(), "1.2.3.4:3301 (storage-1)");

    let srv2 = snapshot.server("srv2").unwrap();
    assert_eq!(srv2.status, ServerStatus::Unreachable);
    assert_eq!(srv2.message.as_deref(), Some("Connection refused"));

    let rs1 = snapshot.replicaset("rs1").unwrap();
    assert_eq!(rs1.failover_priority, vec!["srv1", "srv2"]);
    assert_eq!(rs1.master_uuid.as_deref(), Some("srv1"));
    assert_eq!(rs1.weight, Some(1.0));

    assert_eq!(snapshot.unconfigured_servers().count(), 1);
    assert_eq!(snapshot.issues.len(), 1);
    assert_eq!(snapshot.suggestion_targets(SuggestionKind::RestartReplication), vec!["srv2"]);
    assert!(snapshot.suggestion(SuggestionKind::DisableServers).is_none());
    assert!(snapshot.fetched_at.is_some());
}

#[test]
fn test_boxinfo_without_general_has_unknown_ro() {
    let snapshot = normalize_lists(list_response(), false).unwrap();
    let srv2 = snapshot.server("srv2").unwrap();

    assert!(!srv2.boxinfo.is_empty());
    assert_eq!(srv2.ro, None);
}

#[test]
fn test_absent_boxinfo_is_empty_record() {
    let snapshot = normalize_lists(list_response(), false).unwrap();
    let member = &snapshot.replicaset("rs1").unwrap().servers[1];
    assert_eq!(member.uuid, "srv2");
    assert!(member.boxinfo.is_empty());
    assert_eq!(member.ro, None);

    let unconfigured = snapshot.server_by_uri("1.2.3.4:3310").unwrap();
    assert!(unconfigured.boxinfo.is_empty());
    assert_eq!(unconfigured.ro, None);
}

#[test]
fn test_stats_are_only_kept_when_requested() {
    let with = normalize_lists(list_response(), true).unwrap();
    let stats = with.server_stat.as_ref().unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].uuid, "srv1");

    let without = normalize_lists(list_response(), false).unwrap();
    assert!(without.server_stat.is_none());
}

#[test]
fn test_stat_filtering_is_idempotent() {
    let entries = list_response()["serverStat"].as_array().unwrap().clone();
    let once = filter_server_stat(entries);
    let again = filter_server_stat(
        once.iter()
            .map(|stat| serde_json::to_value(stat).unwrap())
            .collect(),
    );
    assert_eq!(once, again);
}

#[test]
fn test_missing_identity_fields_are_malformed() {
    let mut no_uri = list_response();
    no_uri["serverList"][0]
        .as_object_mut()
        .unwrap()
        .remove("uri");
    assert!(matches!(
        normalize_lists(no_uri, false),
        Err(AdminError::MalformedResponse(_))
    ));

    let mut no_uuid = list_response();
    no_uuid["serverList"][1]
        .as_object_mut()
        .unwrap()
        .remove("uuid");
    assert!(matches!(
        normalize_lists(no_uuid, false),
        Err(AdminError::MalformedResponse(_))
    ));

    let mut no_replicaset_uuid = list_response();
    no_replicaset_uuid["replicasetList"][0]["uuid"] = Value::Null;
    assert!(normalize_lists(no_replicaset_uuid, false).is_err());

    let mut no_lists = list_response();
    no_lists.as_object_mut().unwrap().remove("replicasetList");
    assert!(normalize_lists(no_lists, false).is_err());
}

#[test]
fn test_member_claiming_another_replicaset_is_malformed() {
    let mut response = list_response();
    response["replicasetList"][0]["servers"][0]["replicaset"] = json!({"uuid": "rs9"});
    assert!(matches!(
        normalize_lists(response, false),
        Err(AdminError::MalformedResponse(_))
    ));
}

#[test]
fn test_server_in_two_replicasets_is_malformed() {
    let mut response = list_response();
    let duplicate = json!({
        "uuid": "rs2", "alias": "copy", "roles": [],
        "servers": [{"uuid": "srv1", "uri": "1.2.3.4:3301"}]
    });
    response["replicasetList"]
        .as_array_mut()
        .unwrap()
        .push(duplicate);
    assert!(normalize_lists(response, false).is_err());
}

#[test]
fn test_unknown_status_is_preserved() {
    let mut response = list_response();
    response["serverList"][0]["status"] = json!("BootError");
    let snapshot = normalize_lists(response, false).unwrap();
    assert_eq!(
        snapshot.server("srv1").unwrap().status,
        ServerStatus::Other("BootError".to_string())
    );
}
