//! Topology Store
//!
//! Owns the current [`TopologySnapshot`]. Only a refresh (gateway read plus
//! normalization) replaces it; every reader gets a shared, immutable `Arc`.

use crate::core::{Result, ServerDetails, ServerDetailsRefresh, ServerStat, TopologySnapshot};
use crate::gateway::{self, Operation, RemoteGateway};
use crate::normalize;
use log::{debug, warn};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOptions {
    pub with_stats: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self { with_stats: true }
    }
}

#[derive(Debug, Default)]
struct Current {
    snapshot: Arc<TopologySnapshot>,
    /// Ticket of the list refresh that produced `snapshot`.
    ticket: u64,
    /// Ticket of the refresh that produced `snapshot.server_stat`.
    stat_ticket: u64,
}

pub struct TopologyStore {
    gateway: Arc<dyn RemoteGateway>,
    current: RwLock<Current>,
    next_ticket: AtomicU64,
}

impl TopologyStore {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            current: RwLock::new(Current::default()),
            next_ticket: AtomicU64::new(1),
        }
    }

    pub fn gateway(&self) -> Arc<dyn RemoteGateway> {
        Arc::clone(&self.gateway)
    }

    /// The last good snapshot; empty until the first successful refresh.
    pub fn snapshot(&self) -> Result<Arc<TopologySnapshot>> {
        let current = self.current.read()?;
        Ok(Arc::clone(&current.snapshot))
    }

    fn take_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst)
    }

    /// Installs `snapshot` unless a refresh started later has already landed.
    fn install(&self, ticket: u64, snapshot: TopologySnapshot) -> Result<Arc<TopologySnapshot>> {
        let mut current = self.current.write()?;
        if ticket < current.ticket {
            debug!(
                "discarding refresh #{} completed after newer refresh #{}",
                ticket, current.ticket
            );
            return Ok(Arc::clone(&current.snapshot));
        }
        let mut snapshot = snapshot;
        if snapshot.server_stat.is_some() {
            if ticket < current.stat_ticket {
                // A stat-only refresh started later already landed.
                snapshot.server_stat = current.snapshot.server_stat.clone();
            } else {
                current.stat_ticket = ticket;
            }
        }
        current.ticket = ticket;
        current.snapshot = Arc::new(snapshot);
        Ok(Arc::clone(&current.snapshot))
    }

    /// Merges statistics into whatever snapshot is current.
    ///
    /// Never advances the list ticket, so a list refresh still in flight
    /// is installed when it lands.
    fn install_stats(&self, ticket: u64, stats: Vec<ServerStat>) -> Result<()> {
        let mut current = self.current.write()?;
        if ticket < current.stat_ticket {
            debug!(
                "discarding statistics #{} completed after newer statistics #{}",
                ticket, current.stat_ticket
            );
            return Ok(());
        }
        current.stat_ticket = ticket;
        let mut snapshot = (*current.snapshot).clone();
        snapshot.server_stat = Some(stats);
        current.snapshot = Arc::new(snapshot);
        Ok(())
    }

    /// Re-reads the topology and swaps in a new snapshot.
    ///
    /// Returns the snapshot that is current once this refresh has settled,
    /// which is a newer one when a later refresh overtook this one.
    pub async fn refresh(&self, options: RefreshOptions) -> Result<Arc<TopologySnapshot>> {
        let ticket = self.take_ticket();
        let data = gateway::fetch(
            self.gateway.as_ref(),
            Operation::ServerList,
            json!({ "withStats": options.with_stats }),
        )
        .await?;

        let snapshot = normalize::normalize_lists(data, options.with_stats).inspect_err(|err| {
            warn!("topology refresh #{} dropped: {}", ticket, err);
        })?;
        debug!(
            "refresh #{}: {} servers, {} replicasets, {} suggestions",
            ticket,
            snapshot.servers.len(),
            snapshot.replicasets.len(),
            snapshot.suggestions.len()
        );
        self.install(ticket, snapshot)
    }

    /// Re-reads only the statistics and merges them into the current snapshot.
    pub async fn refresh_server_stat(&self) -> Result<Vec<ServerStat>> {
        let ticket = self.take_ticket();
        let data =
            gateway::fetch(self.gateway.as_ref(), Operation::ServerStat, json!({})).await?;
        let stats = normalize::normalize_server_stat(data)?;
        self.install_stats(ticket, stats.clone())?;
        Ok(stats)
    }

    /// Loads the detail view of one server. Does not touch the snapshot.
    pub async fn server_details(&self, uuid: &str) -> Result<ServerDetails> {
        let data = gateway::fetch(
            self.gateway.as_ref(),
            Operation::ServerDetails,
            json!({ "uuid": uuid }),
        )
        .await?;
        normalize::normalize_server_details(uuid, data)
    }

    /// Re-polls boxinfo and labels of an open detail view.
    pub async fn refresh_server_details(&self, uuid: &str) -> Result<ServerDetailsRefresh> {
        let data = gateway::fetch(
            self.gateway.as_ref(),
            Operation::ServerDetailsRefresh,
            json!({ "uuid": uuid }),
        )
        .await?;
        normalize::normalize_server_details_refresh(uuid, data)
    }
}
