//! Topology Mutation Builder

pub mod client;
pub mod request;

pub use client::{CreateReplicasetArgs, EditReplicasetArgs, TopologyClient, TopologyEditAck};
pub use request::{JoinServer, ReplicasetPatch, ServerPatch, TopologyEditRequest};
