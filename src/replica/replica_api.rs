use crate::cluster::ReplicaId;
use crate::consensus::{SubmitError, Term};
use crate::orchestrator::TIMEOUT_ERROR;
use std::io;

/// ReplicaStateView is what GetState reports. It is read from the engine on every call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplicaStateView {
    pub term: Term,
    pub is_leader: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("not leader")]
    NotLeader { leader_hint: Option<ReplicaId> },

    // Commit status is unknown. Retry with the same (client id, request id).
    #[error("{}", TIMEOUT_ERROR)]
    Timeout,

    #[error("Failed to encode command: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("Failed to persist log entry: {0}")]
    LocalIoError(io::Error),

    #[error("Consensus engine has exited")]
    EngineExited,
}

impl From<SubmitError> for OperationError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::NotLeader { leader_hint } => OperationError::NotLeader { leader_hint },
            SubmitError::LocalIoError(e) => OperationError::LocalIoError(e),
            SubmitError::EngineExited => OperationError::EngineExited,
        }
    }
}
