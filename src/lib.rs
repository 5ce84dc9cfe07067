// ============================================================================
// Cartridge Admin Library
// ============================================================================

pub mod config;
pub mod console;
pub mod core;
pub mod failover;
pub mod gateway;
pub mod normalize;
pub mod remediation;
pub mod store;
pub mod topology;

// Re-export main types for convenience
pub use config::ConsoleConfig;
pub use console::AdminConsole;
pub use core::{
    AdminError, Boxinfo, GatewayError, Issue, Replicaset, Result, Server, ServerDetails,
    ServerDetailsRefresh, ServerStat, ServerStatus, Suggestion, SuggestionKind, TopologySnapshot,
};

// Re-export the gateway seam
pub use gateway::{GatewayRequest, HttpGateway, InMemoryGateway, Operation, RemoteGateway};

// Re-export the reconciliation layer
pub use failover::{ClusterSelf, FailoverClient, FailoverConfig, FailoverMode, PromoteLeaderArgs};
pub use remediation::{
    ApplyOutcome, RemediationController, RemediationKind, RemediationPhase, RemediationState,
};
pub use store::{RefreshOptions, TopologyStore};
pub use topology::{
    CreateReplicasetArgs, EditReplicasetArgs, ServerPatch, TopologyClient, TopologyEditRequest,
};

// ============================================================================
// Quick start
// ============================================================================

/// Builds a console over the in-memory cluster double.
///
/// Handy for trying the API without a running cluster.
///
/// # Examples
///
/// ```
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let console = cartridge_admin::demo_console();
/// let snapshot = console.refresh().await?;
/// assert_eq!(snapshot.replicasets.len(), 2);
///
/// console.topology().expel_server("srv-3").await?;
/// let snapshot = console.refresh().await?;
/// assert!(snapshot.replicaset_of("srv-3").is_none());
/// # Ok(())
/// # }
/// ```
pub fn demo_console() -> AdminConsole {
    AdminConsole::with_gateway(std::sync::Arc::new(InMemoryGateway::demo()))
}
