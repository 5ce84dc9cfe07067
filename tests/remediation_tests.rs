use async_trait::async_trait;
use cartridge_admin::core::GatewayResult;
use cartridge_admin::{
    AdminConsole, ApplyOutcome, GatewayError, GatewayRequest, InMemoryGateway, Operation,
    RemediationKind, RemediationPhase, RemoteGateway, SuggestionKind,
};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, Semaphore};

/// Holds every mutation until the test releases it.
struct GatedGateway {
    inner: InMemoryGateway,
    gate: Semaphore,
    entered: Notify,
    mutations_started: AtomicUsize,
}

impl GatedGateway {
    fn new(inner: InMemoryGateway) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            entered: Notify::new(),
            mutations_started: AtomicUsize::new(0),
        }
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl RemoteGateway for GatedGateway {
    async fn execute(&self, request: GatewayRequest) -> GatewayResult<Value> {
        if request.operation.is_mutation() {
            self.mutations_started.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            let permit = self.gate.acquire().await.unwrap();
            permit.forget();
        }
        self.inner.execute(request).await
    }

    async fn upload_config(&self, document: Vec<u8>) -> GatewayResult<()> {
        self.inner.upload_config(document).await
    }
}

fn storage_cluster() -> InMemoryGateway {
    let gateway = InMemoryGateway::new();
    gateway.add_replicaset(
        "rs1",
        "storage",
        &["vshard-storage"],
        &[("srv1", "1.2.3.4:3301"), ("srv2", "1.2.3.4:3302")],
    );
    gateway.set_alias("srv1", "storage-1");
    gateway.set_suggestion(SuggestionKind::RestartReplication, &["srv1"]);
    gateway
}

#[tokio::test]
async fn test_open_captures_labelled_targets() {
    let gateway = storage_cluster();
    gateway.set_suggestion(SuggestionKind::RestartReplication, &["srv1", "srv2", "ghost"]);
    let console = AdminConsole::with_gateway(Arc::new(gateway));
    console.refresh().await.unwrap();

    let state = console
        .remediation(RemediationKind::RestartReplication)
        .open()
        .unwrap();

    assert!(state.visible);
    assert!(!state.pending);
    let labels: Vec<_> = state.suggestions.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["1.2.3.4:3301 (storage-1)", "1.2.3.4:3302", "ghost"]);
}

#[tokio::test]
async fn test_open_without_suggestions_stays_idle() {
    let console = AdminConsole::with_gateway(Arc::new(storage_cluster()));
    console.refresh().await.unwrap();

    let controller = console.remediation(RemediationKind::ForceConfigReapply);
    assert!(controller.open().is_err());
    assert_eq!(controller.phase().unwrap(), RemediationPhase::Idle);
}

#[tokio::test]
async fn test_rejection_then_retry_success() {
    let gateway = Arc::new(storage_cluster());
    let console = AdminConsole::with_gateway(gateway.clone());
    console.refresh().await.unwrap();
    let controller = console.remediation(RemediationKind::RestartReplication);
    let opened = controller.open().unwrap();

    gateway.fail_next(
        Operation::RestartReplication,
        GatewayError::query("Replication restart failed"),
    );
    let outcome = controller.apply().await.unwrap();
    assert!(matches!(outcome, ApplyOutcome::Failed(_)));

    let failed = controller.state().unwrap();
    assert_eq!(controller.phase().unwrap(), RemediationPhase::Failed);
    assert!(failed.visible);
    assert!(!failed.pending);
    assert_eq!(failed.error.as_deref(), Some("Replication restart failed"));
    assert_eq!(failed.suggestions, opened.suggestions);

    let outcome = console
        .apply_remediation(RemediationKind::RestartReplication)
        .await
        .unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied);

    let state = controller.state().unwrap();
    assert_eq!(controller.phase().unwrap(), RemediationPhase::Idle);
    assert!(!state.visible);
    assert!(state.error.is_none());

    let calls = gateway.calls();
    let mutations: Vec<_> = calls.iter().filter(|c| c.operation.is_mutation()).collect();
    assert_eq!(mutations.len(), 2);
    assert_eq!(mutations[1].variables, serde_json::json!({"uuids": ["srv1"]}));

    // The facade refreshed after the success and the suggestion is gone.
    let snapshot = console.snapshot().unwrap();
    assert!(snapshot.suggestion(SuggestionKind::RestartReplication).is_none());
    assert_eq!(gateway.call_count(Operation::ServerList), 2);
}

#[tokio::test]
async fn test_apply_while_pending_sends_nothing() {
    let gateway = Arc::new(GatedGateway::new(storage_cluster()));
    let console = Arc::new(AdminConsole::with_gateway(gateway.clone()));
    console.refresh().await.unwrap();
    console
        .remediation(RemediationKind::RestartReplication)
        .open()
        .unwrap();

    let in_flight = tokio::spawn({
        let console = console.clone();
        async move {
            console
                .remediation(RemediationKind::RestartReplication)
                .apply()
                .await
        }
    });
    gateway.entered.notified().await;

    let controller = console.remediation(RemediationKind::RestartReplication);
    assert_eq!(controller.phase().unwrap(), RemediationPhase::Pending);
    assert_eq!(controller.apply().await.unwrap(), ApplyOutcome::Ignored);
    assert!(!controller.close().unwrap());
    assert_eq!(gateway.mutations_started.load(Ordering::SeqCst), 1);

    gateway.release();
    assert_eq!(in_flight.await.unwrap().unwrap(), ApplyOutcome::Applied);
    assert_eq!(gateway.mutations_started.load(Ordering::SeqCst), 1);
    assert_eq!(controller.phase().unwrap(), RemediationPhase::Idle);
}

#[tokio::test]
async fn test_detach_ignores_late_completion() {
    let inner = storage_cluster();
    inner.fail_next(Operation::RestartReplication, GatewayError::query("too late"));
    let gateway = Arc::new(GatedGateway::new(inner));
    let console = Arc::new(AdminConsole::with_gateway(gateway.clone()));
    console.refresh().await.unwrap();
    console
        .remediation(RemediationKind::RestartReplication)
        .open()
        .unwrap();

    let in_flight = tokio::spawn({
        let console = console.clone();
        async move {
            console
                .remediation(RemediationKind::RestartReplication)
                .apply()
                .await
        }
    });
    gateway.entered.notified().await;

    let controller = console.remediation(RemediationKind::RestartReplication);
    controller.detach().unwrap();
    gateway.release();

    assert_eq!(in_flight.await.unwrap().unwrap(), ApplyOutcome::Stale);
    let state = controller.state().unwrap();
    assert!(!state.visible);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_close_discards_snapshot_and_error() {
    let gateway = Arc::new(storage_cluster());
    let console = AdminConsole::with_gateway(gateway.clone());
    console.refresh().await.unwrap();
    let controller = console.remediation(RemediationKind::RestartReplication);
    controller.open().unwrap();
    gateway.fail_next(Operation::RestartReplication, GatewayError::transport("connection reset"));
    controller.apply().await.unwrap();
    assert!(controller.state().unwrap().error.is_some());

    assert!(controller.close().unwrap());
    let state = controller.state().unwrap();
    assert!(!state.visible);
    assert!(state.suggestions.is_empty());
    assert!(state.error.is_none());

    // A closed controller ignores apply.
    assert_eq!(controller.apply().await.unwrap(), ApplyOutcome::Ignored);
}

#[tokio::test]
async fn test_disable_servers_remediation_marks_servers_disabled() {
    let gateway = Arc::new(storage_cluster());
    gateway.set_suggestion(SuggestionKind::DisableServers, &["srv2"]);
    let console = AdminConsole::with_gateway(gateway.clone());
    console.refresh().await.unwrap();

    console
        .remediation(RemediationKind::DisableServers)
        .open()
        .unwrap();
    let outcome = console
        .apply_remediation(RemediationKind::DisableServers)
        .await
        .unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied);

    let snapshot = console.snapshot().unwrap();
    assert!(snapshot.server("srv2").unwrap().disabled);
    assert!(snapshot.suggestion(SuggestionKind::DisableServers).is_none());
}

#[tokio::test]
async fn test_failed_refresh_after_apply_still_reports_applied() {
    let gateway = Arc::new(storage_cluster());
    let console = AdminConsole::with_gateway(gateway.clone());
    let before = console.refresh().await.unwrap();
    console
        .remediation(RemediationKind::RestartReplication)
        .open()
        .unwrap();

    gateway.fail_next(Operation::ServerList, GatewayError::transport("timeout"));
    let outcome = console
        .apply_remediation(RemediationKind::RestartReplication)
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Applied);
    let controller = console.remediation(RemediationKind::RestartReplication);
    assert_eq!(controller.phase().unwrap(), RemediationPhase::Idle);
    assert_eq!(gateway.mutation_count(), 1);
    assert!(Arc::ptr_eq(&before, &console.snapshot().unwrap()));

    let after = console.refresh().await.unwrap();
    assert!(after.suggestion(SuggestionKind::RestartReplication).is_none());
}
