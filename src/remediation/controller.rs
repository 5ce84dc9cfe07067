use super::kind::RemediationKind;
use crate::core::{AdminError, Result};
use crate::gateway::{self, RemoteGateway};
use crate::store::TopologyStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// A captured suggestion target and the label shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionTarget {
    pub uuid: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationState {
    pub visible: bool,
    pub suggestions: Vec<SuggestionTarget>,
    pub pending: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemediationPhase {
    Idle,
    Visible,
    Pending,
    /// Visible with the error of the last attempt.
    Failed,
}

impl RemediationState {
    pub fn phase(&self) -> RemediationPhase {
        match (self.visible, self.pending, self.error.is_some()) {
            (_, true, _) => RemediationPhase::Pending,
            (true, false, true) => RemediationPhase::Failed,
            (true, false, false) => RemediationPhase::Visible,
            (false, false, _) => RemediationPhase::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The mutation succeeded; the controller is idle again.
    Applied,
    /// The mutation was rejected; the snapshot is kept for a retry.
    Failed(AdminError),
    /// Not visible, or an apply is already pending. Nothing was sent.
    Ignored,
    /// The controller was detached while the mutation was in flight.
    Stale,
}

#[derive(Debug, Default)]
struct ControllerInner {
    state: RemediationState,
    session: u64,
}

/// Drives one remediation kind through `idle → visible → pending → idle | visible+error`.
pub struct RemediationController {
    kind: RemediationKind,
    gateway: Arc<dyn RemoteGateway>,
    store: Arc<TopologyStore>,
    inner: Mutex<ControllerInner>,
}

impl RemediationController {
    pub fn new(
        kind: RemediationKind,
        gateway: Arc<dyn RemoteGateway>,
        store: Arc<TopologyStore>,
    ) -> Self {
        Self {
            kind,
            gateway,
            store,
            inner: Mutex::new(ControllerInner::default()),
        }
    }

    pub fn kind(&self) -> RemediationKind {
        self.kind
    }

    pub fn state(&self) -> Result<RemediationState> {
        Ok(self.inner.lock()?.state.clone())
    }

    pub fn phase(&self) -> Result<RemediationPhase> {
        Ok(self.inner.lock()?.state.phase())
    }

    /// Captures the current targets of this kind and makes the controller visible.
    pub fn open(&self) -> Result<RemediationState> {
        let snapshot = self.store.snapshot()?;
        let targets: Vec<SuggestionTarget> = snapshot
            .suggestion_targets(self.kind.suggestion_kind())
            .into_iter()
            .map(|uuid| SuggestionTarget {
                label: snapshot.server_label(&uuid),
                uuid,
            })
            .collect();

        let mut inner = self.inner.lock()?;
        if inner.state.pending {
            return Err(AdminError::InvalidRequest(format!(
                "{} is already in progress",
                self.kind.title()
            )));
        }
        if targets.is_empty() {
            return Err(AdminError::InvalidRequest(format!(
                "there is nothing to {}",
                self.kind.title().to_lowercase()
            )));
        }
        inner.state = RemediationState {
            visible: true,
            suggestions: targets,
            pending: false,
            error: None,
        };
        Ok(inner.state.clone())
    }

    /// Submits the remediation for the captured targets.
    pub async fn apply(&self) -> Result<ApplyOutcome> {
        let (uuids, session) = {
            let mut inner = self.inner.lock()?;
            if !inner.state.visible || inner.state.pending {
                return Ok(ApplyOutcome::Ignored);
            }
            inner.state.pending = true;
            let uuids: Vec<String> = inner
                .state
                .suggestions
                .iter()
                .map(|target| target.uuid.clone())
                .collect();
            (uuids, inner.session)
        };

        let result = gateway::mutate(
            self.gateway.as_ref(),
            self.kind.operation(),
            json!({ "uuids": uuids }),
        )
        .await;

        let mut inner = self.inner.lock()?;
        if inner.session != session {
            debug!("{}: completion after detach ignored", self.kind.title());
            return Ok(ApplyOutcome::Stale);
        }
        match result {
            Ok(_) => {
                info!("{} applied to {} servers", self.kind.title(), uuids.len());
                inner.state = RemediationState::default();
                Ok(ApplyOutcome::Applied)
            }
            Err(err) => {
                warn!("{} failed: {}", self.kind.title(), err);
                inner.state.pending = false;
                inner.state.error = Some(err.user_message());
                Ok(ApplyOutcome::Failed(err))
            }
        }
    }

    /// Hides the controller and drops the snapshot. Does nothing while pending.
    pub fn close(&self) -> Result<bool> {
        let mut inner = self.inner.lock()?;
        if inner.state.pending {
            return Ok(false);
        }
        inner.state = RemediationState::default();
        Ok(true)
    }

    /// Resets unconditionally; a mutation still in flight is ignored when it completes.
    pub fn detach(&self) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.session += 1;
        inner.state = RemediationState::default();
        Ok(())
    }
}
