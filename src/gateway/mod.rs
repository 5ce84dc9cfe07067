//! Remote Data Gateway
//!
//! The seam between the console core and the cluster's admin API. The core
//! only relies on the request/response contract: an [`Operation`] plus JSON
//! variables goes in, the operation's `data` object or a [`GatewayError`]
//! comes out.

pub mod documents;
pub mod http;
pub mod in_memory;

pub use http::HttpGateway;
pub use in_memory::InMemoryGateway;

use crate::core::{AdminError, GatewayResult, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Instrument, Level, event, info_span};

/// Content type of the raw configuration upload.
pub const CONFIG_CONTENT_TYPE: &str = "application/yaml;charset=UTF-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// Every GraphQL operation the console issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    ServerList,
    ServerStat,
    ServerDetails,
    ServerDetailsRefresh,
    ClusterSelf,
    FailoverParams,
    EditTopology,
    ProbeServer,
    BootstrapVshard,
    ChangeFailover,
    PromoteFailoverLeader,
    DisableServers,
    RestartReplication,
    ConfigForceReapply,
}

impl Operation {
    /// GraphQL `operationName`.
    pub fn name(self) -> &'static str {
        match self {
            Self::ServerList => "serverList",
            Self::ServerStat => "serverStat",
            Self::ServerDetails => "serverDetails",
            Self::ServerDetailsRefresh => "serverDetailsRefresh",
            Self::ClusterSelf => "clusterSelf",
            Self::FailoverParams => "getFailoverParams",
            Self::EditTopology => "editTopology",
            Self::ProbeServer => "probe",
            Self::BootstrapVshard => "bootstrap",
            Self::ChangeFailover => "changeFailover",
            Self::PromoteFailoverLeader => "promoteFailoverLeader",
            Self::DisableServers => "disableServers",
            Self::RestartReplication => "restartReplication",
            Self::ConfigForceReapply => "configForceReapply",
        }
    }

    pub fn kind(self) -> OperationKind {
        match self {
            Self::ServerList
            | Self::ServerStat
            | Self::ServerDetails
            | Self::ServerDetailsRefresh
            | Self::ClusterSelf
            | Self::FailoverParams => OperationKind::Query,
            _ => OperationKind::Mutation,
        }
    }

    pub fn is_mutation(self) -> bool {
        self.kind() == OperationKind::Mutation
    }

    pub fn document(self) -> &'static str {
        documents::document_for(self)
    }
}

/// One request to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRequest {
    pub operation: Operation,
    pub variables: Value,
}

impl GatewayRequest {
    pub fn new(operation: Operation, variables: Value) -> Self {
        Self {
            operation,
            variables,
        }
    }

    pub fn without_variables(operation: Operation) -> Self {
        Self::new(operation, json!({}))
    }

    /// GraphQL-over-HTTP body for this request.
    pub fn to_body(&self) -> Value {
        json!({
            "query": self.operation.document(),
            "variables": self.variables,
            "operationName": self.operation.name(),
        })
    }
}

/// Executes queries and mutations against the cluster.
///
/// Completion of every call is delivered asynchronously; nothing submitted
/// through a gateway can be cancelled once sent.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Runs one GraphQL operation and returns its `data` object.
    async fn execute(&self, request: GatewayRequest) -> GatewayResult<Value>;

    /// Uploads a raw YAML configuration document (non-GraphQL endpoint).
    async fn upload_config(&self, document: Vec<u8>) -> GatewayResult<()>;
}

/// Runs a read query, classifying failures as query errors.
pub async fn fetch(
    gateway: &dyn RemoteGateway,
    operation: Operation,
    variables: Value,
) -> Result<Value> {
    if operation.is_mutation() {
        return Err(AdminError::InvalidRequest(format!(
            "'{}' is a mutation and cannot be fetched",
            operation.name()
        )));
    }
    let span = info_span!("gateway.fetch", operation = %operation.name());
    async move {
        match gateway
            .execute(GatewayRequest::new(operation, variables))
            .await
        {
            Ok(data) => Ok(data),
            Err(err) => {
                event!(Level::WARN, error = %err, "gateway query failed");
                Err(AdminError::from_query(err))
            }
        }
    }
    .instrument(span)
    .await
}

/// Submits a mutation, classifying failures as rejected mutations.
pub async fn mutate(
    gateway: &dyn RemoteGateway,
    operation: Operation,
    variables: Value,
) -> Result<Value> {
    if !operation.is_mutation() {
        return Err(AdminError::InvalidRequest(format!(
            "'{}' is a query and cannot be submitted as a mutation",
            operation.name()
        )));
    }
    let span = info_span!("gateway.mutate", operation = %operation.name());
    async move {
        match gateway
            .execute(GatewayRequest::new(operation, variables))
            .await
        {
            Ok(data) => {
                event!(Level::DEBUG, "gateway mutation applied");
                Ok(data)
            }
            Err(err) => {
                event!(Level::WARN, error = %err, "gateway mutation failed");
                Err(AdminError::from_mutation(err))
            }
        }
    }
    .instrument(span)
    .await
}

/// Uploads a configuration document through the side channel.
pub async fn upload_config(gateway: &dyn RemoteGateway, document: Vec<u8>) -> Result<()> {
    if document.is_empty() {
        return Err(AdminError::InvalidRequest(
            "configuration document must not be empty".to_string(),
        ));
    }
    gateway
        .upload_config(document)
        .await
        .map_err(AdminError::from_mutation)
}
