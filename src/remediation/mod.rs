//! Suggestion Remediation Controller

pub mod controller;
pub mod kind;

pub use controller::{
    ApplyOutcome, RemediationController, RemediationPhase, RemediationState, SuggestionTarget,
};
pub use kind::RemediationKind;
