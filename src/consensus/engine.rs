use crate::cluster::ReplicaId;
use crate::commitlog::Index;
use crate::consensus::Term;
use bytes::Bytes;
use std::io;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Role {
    Follower,
    Candidate,
    Leader,
}

/// EngineState is the engine's view of who leads which term. Only the engine mutates it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineState {
    pub term: Term,
    pub role: Role,
    /// Best known leader for `term`. When `role` is Leader, this is the local replica.
    pub leader_hint: Option<ReplicaId>,
}

impl EngineState {
    pub fn initial() -> Self {
        EngineState {
            term: Term::new(0),
            role: Role::Follower,
            leader_hint: None,
        }
    }

    pub fn is_leader(&self) -> bool {
        self.role == Role::Leader
    }
}

/// EntryId identifies a log entry accepted by the engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EntryId {
    pub term: Term,
    pub index: Index,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("not leader")]
    NotLeader { leader_hint: Option<ReplicaId> },

    #[error("Failed to persist log entry: {0}")]
    LocalIoError(io::Error),

    // Engine logic runs on a background task. This error is returned if the task has exited.
    #[error("Consensus engine has exited")]
    EngineExited,
}

/// ConsensusEngine is the seam between a replica and whatever decides leadership and replicates
/// the log. The replica never caches what this returns; every call reads it fresh.
///
/// Entries accepted by `submit()` are delivered, in log order, on the `CommitStream` the engine
/// handed out when it was created. An accepted entry is not necessarily a committed one.
#[async_trait::async_trait]
pub trait ConsensusEngine: Send + Sync + 'static {
    fn current_state(&self) -> EngineState;

    async fn submit(&self, data: Bytes) -> Result<EntryId, SubmitError>;
}
