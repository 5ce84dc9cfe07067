pub mod error;
pub mod snapshot;
pub mod types;

pub use error::{AdminError, GatewayError, GatewayResult, QueryError, Result, TransportError};
pub use snapshot::TopologySnapshot;
pub use types::{
    Boxinfo, BoxinfoDescriptions, Issue, Replicaset, Server, ServerDetails, ServerDetailsRefresh,
    ServerStat, ServerStatus, Suggestion, SuggestionKind,
};
