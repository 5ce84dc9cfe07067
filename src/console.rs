//! Admin Console facade
//!
//! Wires the gateway, the topology store, the mutation builder, the three
//! remediation controllers and the failover client together.

use crate::config::ConsoleConfig;
use crate::core::{AdminError, Result, TopologySnapshot};
use crate::failover::FailoverClient;
use crate::gateway::{self, HttpGateway, RemoteGateway};
use crate::remediation::{ApplyOutcome, RemediationController, RemediationKind};
use crate::store::{RefreshOptions, TopologyStore};
use crate::topology::TopologyClient;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

pub struct AdminConsole {
    gateway: Arc<dyn RemoteGateway>,
    store: Arc<TopologyStore>,
    topology: TopologyClient,
    failover: FailoverClient,
    remediations: Vec<RemediationController>,
    refresh_options: RefreshOptions,
}

impl AdminConsole {
    /// Connects to a live cluster over HTTP.
    pub fn connect(config: &ConsoleConfig) -> Result<Self> {
        let gateway = HttpGateway::new(config)?;
        info!("admin console connected to {}", config.to_url());
        let mut console = Self::with_gateway(Arc::new(gateway));
        console.refresh_options = RefreshOptions {
            with_stats: config.with_stats,
        };
        Ok(console)
    }

    pub fn with_gateway(gateway: Arc<dyn RemoteGateway>) -> Self {
        let store = Arc::new(TopologyStore::new(Arc::clone(&gateway)));
        let topology = TopologyClient::attached(Arc::clone(&gateway), Arc::clone(&store));
        let failover = FailoverClient::new(Arc::clone(&gateway));
        let remediations = RemediationKind::ALL
            .into_iter()
            .map(|kind| RemediationController::new(kind, Arc::clone(&gateway), Arc::clone(&store)))
            .collect();
        Self {
            gateway,
            store,
            topology,
            failover,
            remediations,
            refresh_options: RefreshOptions::default(),
        }
    }

    pub fn store(&self) -> &Arc<TopologyStore> {
        &self.store
    }

    pub fn topology(&self) -> &TopologyClient {
        &self.topology
    }

    pub fn failover(&self) -> &FailoverClient {
        &self.failover
    }

    pub fn remediation(&self, kind: RemediationKind) -> &RemediationController {
        // `with_gateway` builds one controller per kind in `ALL` order.
        let index = RemediationKind::ALL
            .iter()
            .position(|candidate| *candidate == kind)
            .unwrap_or_default();
        &self.remediations[index]
    }

    pub fn snapshot(&self) -> Result<Arc<TopologySnapshot>> {
        self.store.snapshot()
    }

    pub async fn refresh(&self) -> Result<Arc<TopologySnapshot>> {
        self.store.refresh(self.refresh_options).await
    }

    /// Applies an opened remediation and refreshes the store when it succeeded.
    ///
    /// A failed follow-up refresh is logged and leaves the previous snapshot
    /// installed; the outcome still reports the applied mutation.
    pub async fn apply_remediation(&self, kind: RemediationKind) -> Result<ApplyOutcome> {
        let outcome = self.remediation(kind).apply().await?;
        if outcome == ApplyOutcome::Applied {
            if let Err(err) = self.refresh().await {
                warn!("{} applied, but the follow-up refresh failed: {}", kind.title(), err);
            }
        }
        Ok(outcome)
    }

    pub async fn upload_config(&self, document: Vec<u8>) -> Result<()> {
        gateway::upload_config(self.gateway.as_ref(), document).await?;
        info!("configuration uploaded");
        Ok(())
    }

    pub async fn upload_config_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let document = tokio::fs::read(path).await.map_err(|e| {
            AdminError::Io(format!("cannot read '{}': {}", path.display(), e))
        })?;
        self.upload_config(document).await
    }
}
