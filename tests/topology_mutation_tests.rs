use cartridge_admin::gateway::InMemoryGateway;
use cartridge_admin::{
    AdminError, CreateReplicasetArgs, EditReplicasetArgs, GatewayError, Operation, RefreshOptions,
    ServerPatch, TopologyClient, TopologyEditRequest, TopologyStore,
};
use serde_json::json;
use std::sync::Arc;

fn detached(gateway: &Arc<InMemoryGateway>) -> TopologyClient {
    TopologyClient::new(gateway.clone())
}

async fn attached(gateway: &Arc<InMemoryGateway>) -> (TopologyClient, Arc<TopologyStore>) {
    let store = Arc::new(TopologyStore::new(gateway.clone()));
    store.refresh(RefreshOptions::default()).await.unwrap();
    (TopologyClient::attached(gateway.clone(), store.clone()), store)
}

#[tokio::test]
async fn test_edit_servers_coalesces_into_one_mutation() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let client = detached(&gateway);

    let ack = client
        .edit_servers(vec![
            ServerPatch::disable("srv-2", true),
            ServerPatch::expel("srv-3"),
        ])
        .await
        .unwrap();

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, Operation::EditTopology);
    assert_eq!(
        calls[0].variables,
        json!({"servers": [
            {"uuid": "srv-2", "disabled": true},
            {"uuid": "srv-3", "expelled": true}
        ]})
    );
    assert_eq!(ack.servers, vec!["srv-2"]);
}

#[tokio::test]
async fn test_expel_payload_and_effect() {
    let gateway = Arc::new(InMemoryGateway::new());
    gateway.add_replicaset(
        "rs1",
        "storage",
        &["vshard-storage"],
        &[("srv1", "localhost:3301"), ("srv2", "localhost:3302")],
    );
    let (client, store) = attached(&gateway).await;

    client.expel_server("srv1").await.unwrap();

    let calls = gateway.calls();
    let mutation = calls.iter().find(|call| call.operation.is_mutation()).unwrap();
    assert_eq!(
        mutation.variables,
        json!({"servers": [{"uuid": "srv1", "expelled": true}]})
    );

    // No refresh happens on its own.
    assert!(store.snapshot().unwrap().replicaset_of("srv1").is_some());

    let snapshot = store.refresh(RefreshOptions::default()).await.unwrap();
    assert!(snapshot.replicasets.iter().all(|rs| !rs.contains("srv1")));
    assert!(snapshot.server("srv1").is_none());
    assert_eq!(snapshot.replicaset("rs1").unwrap().failover_priority, vec!["srv2"]);
}

#[tokio::test]
async fn test_unknown_uuid_is_rejected_before_submission() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let (client, _store) = attached(&gateway).await;

    let err = client.disable_server("srv-404", true).await.unwrap_err();
    assert!(matches!(err, AdminError::InvalidRequest(_)));
    assert_eq!(gateway.mutation_count(), 0);
}

#[tokio::test]
async fn test_backend_rejection_keeps_query_family() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let client = detached(&gateway);
    let before = gateway.list_data(false);

    let err = client.expel_server("srv-404").await.unwrap_err();
    match &err {
        AdminError::MutationRejected(GatewayError::Query(query)) => {
            assert!(query.message.contains("srv-404"));
        }
        other => panic!("expected a rejected mutation, got {other:?}"),
    }
    assert_eq!(gateway.list_data(false), before);
}

#[tokio::test]
async fn test_transport_failure_is_not_a_rejection() {
    let gateway = Arc::new(InMemoryGateway::demo());
    gateway.fail_next(
        Operation::EditTopology,
        GatewayError::transport_status(403, "Forbidden"),
    );

    let err = detached(&gateway)
        .disable_server("srv-2", true)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::TransportFailure(_)));
    assert!(err.is_access_denied());
}

#[tokio::test]
async fn test_create_replicaset_from_unconfigured_server() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let (client, store) = attached(&gateway).await;

    let ack = client
        .create_replicaset(CreateReplicasetArgs {
            alias: Some("storage-b".to_string()),
            roles: vec!["vshard-storage".to_string()],
            vshard_group: Some("default".to_string()),
            weight: Some(1.0),
            all_rw: None,
            join_servers: vec!["localhost:3304".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(ack.replicasets.len(), 1);
    assert_eq!(ack.servers.len(), 1);

    let snapshot = store.refresh(RefreshOptions::default()).await.unwrap();
    let created = snapshot.replicaset(&ack.replicasets[0]).unwrap();
    assert_eq!(created.alias.as_deref(), Some("storage-b"));
    assert_eq!(created.servers[0].uri, "localhost:3304");
    assert_eq!(created.servers[0].ro, Some(false));
    assert_eq!(snapshot.unconfigured_servers().count(), 0);
}

#[tokio::test]
async fn test_join_and_reorder_failover_priority() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let (client, store) = attached(&gateway).await;

    assert!(client.probe("localhost:3305").await.unwrap());
    store.refresh(RefreshOptions::default()).await.unwrap();

    let ack = client
        .join_server("localhost:3305", "rs-storage")
        .await
        .unwrap();
    let joined = ack.servers[0].clone();

    store.refresh(RefreshOptions::default()).await.unwrap();
    client
        .edit_replicaset(EditReplicasetArgs {
            uuid: "rs-storage".to_string(),
            master: Some(joined.clone()),
            ..EditReplicasetArgs::default()
        })
        .await
        .unwrap();

    let snapshot = store.refresh(RefreshOptions::default()).await.unwrap();
    let storage = snapshot.replicaset("rs-storage").unwrap();
    assert_eq!(storage.failover_priority, vec![joined.clone(), "srv-2".into(), "srv-3".into()]);
    assert_eq!(storage.master_uuid.as_deref(), Some(joined.as_str()));
}

#[tokio::test]
async fn test_joining_a_configured_server_is_rejected_locally() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let (client, _store) = attached(&gateway).await;

    let err = client
        .join_server("localhost:3302", "rs-router")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::InvalidRequest(_)));
    assert_eq!(gateway.mutation_count(), 0);
}

#[tokio::test]
async fn test_probe_and_bootstrap_carry_no_edit_body() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let client = detached(&gateway);

    client.probe("localhost:3320").await.unwrap();
    assert!(client.bootstrap_vshard().await.unwrap());

    let calls = gateway.calls();
    assert_eq!(calls[0].operation, Operation::ProbeServer);
    assert_eq!(calls[0].variables, json!({"uri": "localhost:3320"}));
    assert_eq!(calls[1].operation, Operation::BootstrapVshard);
    assert_eq!(gateway.call_count(Operation::EditTopology), 0);

    let again = client.bootstrap_vshard().await.unwrap_err();
    assert!(matches!(again, AdminError::MutationRejected(_)));
}

#[tokio::test]
async fn test_empty_edit_is_invalid() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let err = detached(&gateway)
        .edit_topology(TopologyEditRequest::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::InvalidRequest(_)));
    assert!(gateway.calls().is_empty());
}
