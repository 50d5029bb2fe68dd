use crate::cluster::ReplicaId;
use crate::grpc::{ProtoLeaderHint, ProtoReply};

pub const NO_LEADER_ERROR: &str = "no leader available, retry after backoff";

/// Error text of a request whose commit status is unknown. Retrying with the same request id is safe.
pub const TIMEOUT_ERROR: &str = "timed out waiting for commit, retry with the same request id";

/// ClientReply is the outcome of a Get/Put as seen by whoever issued it. Failures are carried in
/// `error` rather than as a transport error so that `wrong_leader` is always readable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClientReply {
    pub value: String,
    pub error: String,
    pub wrong_leader: bool,
    pub leader_hint: Option<ReplicaId>,
}

impl ClientReply {
    pub fn is_ok(&self) -> bool {
        self.error.is_empty() && !self.wrong_leader
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ClientReply {
            error: error.into(),
            ..Default::default()
        }
    }

    pub fn no_leader() -> Self {
        ClientReply {
            error: NO_LEADER_ERROR.to_string(),
            wrong_leader: true,
            ..Default::default()
        }
    }
}

impl From<ProtoReply> for ClientReply {
    fn from(reply: ProtoReply) -> Self {
        ClientReply {
            value: reply.value,
            error: reply.error,
            wrong_leader: reply.wrong_leader,
            leader_hint: reply.leader_hint.map(|hint| ReplicaId::new(hint.replica_id)),
        }
    }
}

impl From<ClientReply> for ProtoReply {
    fn from(reply: ClientReply) -> Self {
        ProtoReply {
            value: reply.value,
            error: reply.error,
            wrong_leader: reply.wrong_leader,
            leader_hint: reply.leader_hint.map(|id| ProtoLeaderHint {
                replica_id: id.as_u32(),
            }),
        }
    }
}
