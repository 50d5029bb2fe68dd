use crate::cluster::ReplicaId;
use crate::commitlog::Index;
use crate::consensus::replicated_log::EngineLogEntry;
use crate::consensus::Term;
use std::io;

/// AppendEntriesInput carries the leader's entries following `previous_log_entry`, and how far the
/// leader has committed. With no entries it is a heartbeat.
#[derive(Clone, Debug)]
pub(crate) struct AppendEntriesInput {
    pub(crate) leader_id: ReplicaId,
    pub(crate) term: Term,
    pub(crate) previous_log_entry: Option<(Term, Index)>,
    pub(crate) commit_index: Option<Index>,
    pub(crate) entries: Vec<EngineLogEntry>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum AppendEntriesError {
    #[error("Leader term is older than current term {current_term:?}")]
    StaleTerm { current_term: Term },

    #[error("No entry matching the leader's previous entry (last index {last_index:?})")]
    MissingPreviousLogEntry { last_index: Option<Index> },

    #[error("Term {term:?} already has leader {leader}")]
    ConflictingLeader { term: Term, leader: ReplicaId },

    #[error("Failed to update local log: {0}")]
    LocalIoError(#[from] io::Error),

    #[error("Consensus engine has exited")]
    EngineExited,
}

#[derive(Clone, Debug)]
pub(crate) struct RequestVoteInput {
    pub(crate) candidate_id: ReplicaId,
    pub(crate) term: Term,
    pub(crate) last_log_entry: Option<(Term, Index)>,
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct RequestVoteOutput {
    pub(crate) vote_granted: bool,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub(crate) enum RequestVoteError {
    #[error("Candidate term is older than current term {current_term:?}")]
    StaleTerm { current_term: Term },

    #[error("Consensus engine has exited")]
    EngineExited,
}

/// How a peer answered one of our calls, as seen from the caller's side of the wire.
#[derive(Debug)]
pub(crate) enum PeerReplyError {
    StaleTerm { new_term: Term },
    PeerLogBehind { last_index: Option<Index> },
    Retryable(String),
}

/// AppendEntriesReplyFromPeer pairs a peer's answer with what the leader sent it.
#[derive(Debug)]
pub(crate) struct AppendEntriesReplyFromPeer {
    pub(crate) peer_id: ReplicaId,
    pub(crate) term: Term,
    pub(crate) previous_log_entry_index: Option<Index>,
    pub(crate) num_entries: usize,
    pub(crate) result: Result<(), PeerReplyError>,
}

#[derive(Debug)]
pub(crate) struct RequestVoteReplyFromPeer {
    pub(crate) peer_id: ReplicaId,
    pub(crate) term: Term,
    pub(crate) result: Result<bool, PeerReplyError>,
}
