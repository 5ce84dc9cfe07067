use cartridge_admin::{
    AdminError, FailoverClient, FailoverConfig, FailoverMode, InMemoryGateway, Operation,
    PromoteLeaderArgs,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_get_failover_passes_params_through() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let client = FailoverClient::new(gateway.clone());

    let config = client.get_failover().await.unwrap();
    assert_eq!(config.mode, FailoverMode::Disabled);
    assert_eq!(config.failover_timeout, Some(20.0));
    assert_eq!(gateway.calls().len(), 1);
    assert_eq!(gateway.call_count(Operation::FailoverParams), 1);
}

#[tokio::test]
async fn test_change_failover_always_rereads_cluster_self() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let client = FailoverClient::new(gateway.clone());

    let mut config = FailoverConfig::with_mode(FailoverMode::Stateful);
    config.state_provider = Some("tarantool".to_string());
    config.tarantool_params = Some(json!({"uri": "localhost:4401", "password": "secret"}));

    let cluster = client.change_failover(config).await.unwrap();

    let operations: Vec<_> = gateway.calls().iter().map(|call| call.operation).collect();
    assert_eq!(operations, vec![Operation::ChangeFailover, Operation::ClusterSelf]);
    let params = cluster.failover_params.unwrap();
    assert_eq!(params.mode, FailoverMode::Stateful);
    assert_eq!(params.state_provider.as_deref(), Some("tarantool"));
    assert_eq!(params.tarantool_params.unwrap()["uri"], "localhost:4401");
    assert_eq!(cluster.known_roles.len(), 3);
}

#[tokio::test]
async fn test_change_failover_rejection_skips_reread() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let client = FailoverClient::new(gateway.clone());
    gateway.fail_next(
        Operation::ChangeFailover,
        cartridge_admin::GatewayError::query("Failover mode is locked"),
    );

    let err = client
        .change_failover(FailoverConfig::with_mode(FailoverMode::Eventual))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::MutationRejected(_)));
    assert_eq!(gateway.call_count(Operation::ClusterSelf), 0);
}

#[tokio::test]
async fn test_stateful_without_provider_is_left_to_the_cluster() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let err = FailoverClient::new(gateway.clone())
        .change_failover(FailoverConfig::with_mode(FailoverMode::Stateful))
        .await
        .unwrap_err();

    assert!(matches!(err, AdminError::MutationRejected(_)));
    assert!(err.user_message().contains("state_provider"));
    let operations: Vec<_> = gateway.calls().iter().map(|call| call.operation).collect();
    assert_eq!(operations, vec![Operation::ChangeFailover]);
}

#[tokio::test]
async fn test_unknown_mode_passes_through_reads() {
    let gateway = Arc::new(InMemoryGateway::demo());
    gateway.set_failover_mode("manual");
    let client = FailoverClient::new(gateway);

    let config = client.get_failover().await.unwrap();
    assert_eq!(config.mode, FailoverMode::Other("manual".to_string()));
    assert_eq!(config.mode.to_string(), "manual");

    let cluster = client.cluster_self().await.unwrap();
    assert_eq!(
        cluster.failover_params.unwrap().mode.as_str(),
        "manual"
    );
}

#[tokio::test]
async fn test_promote_never_reads_cluster_self() {
    let gateway = Arc::new(InMemoryGateway::demo());
    gateway.set_failover_mode("raft");
    let client = FailoverClient::new(gateway.clone());

    let acknowledged = client
        .promote_failover_leader(PromoteLeaderArgs {
            replicaset_uuid: "rs-storage".to_string(),
            instance_uuid: "srv-3".to_string(),
            force_inconsistency: false,
        })
        .await
        .unwrap();

    assert!(acknowledged);
    assert_eq!(gateway.calls().len(), 1);
    assert_eq!(gateway.call_count(Operation::ClusterSelf), 0);
    assert_eq!(
        gateway.calls()[0].variables,
        json!({"replicaset_uuid": "rs-storage", "instance_uuid": "srv-3", "force_inconsistency": false})
    );

    let list = gateway.list_data(false);
    let storage = list["replicasetList"]
        .as_array()
        .unwrap()
        .iter()
        .find(|rs| rs["uuid"] == "rs-storage")
        .unwrap();
    assert_eq!(storage["active_master"]["uuid"], "srv-3");
}

#[tokio::test]
async fn test_promote_in_disabled_mode_is_rejected() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let err = FailoverClient::new(gateway)
        .promote_failover_leader(PromoteLeaderArgs {
            replicaset_uuid: "rs-storage".to_string(),
            instance_uuid: "srv-3".to_string(),
            force_inconsistency: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::MutationRejected(_)));
    assert!(err.user_message().contains("stateful"));
}

#[tokio::test]
async fn test_cluster_self_reports_bootstrap_capability() {
    let gateway = Arc::new(InMemoryGateway::demo());
    let client = FailoverClient::new(gateway.clone());

    let before = client.cluster_self().await.unwrap();
    assert!(before.can_bootstrap_vshard);
    assert_eq!(before.self_info.uri.as_deref(), Some("localhost:3301"));

    gateway.set_vshard_bootstrapped(true);
    let after = client.cluster_self().await.unwrap();
    assert!(!after.can_bootstrap_vshard);
    assert!(after.vshard_groups[0].bootstrapped);
}
