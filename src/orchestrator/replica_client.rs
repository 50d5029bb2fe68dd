use crate::cluster::{ReplicaId, ReplicaIdentity};
use crate::consensus::{Role, RoleAssignment, Term};
use crate::grpc::key_value_store_client::KeyValueStoreClient;
use crate::grpc::{ProtoEmpty, ProtoGetKey, ProtoKeyValue, ProtoLeaderHint, ProtoRole, ProtoRoleAssignment};
use crate::orchestrator::ClientReply;
use crate::replica::{ClientRequestKey, ReplicaStateView};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Response, Status};

#[derive(Debug, thiserror::Error)]
pub enum ReplicaCallError {
    // Retryable with backoff. Replica is down, restarting, or the network is unhappy.
    #[error("Replica is unreachable: {0}")]
    Unreachable(String),

    #[error("Replica did not answer within the RPC deadline")]
    Timeout,

    #[error("Replica rejected the request: {0}")]
    Rejected(String),

    #[error("Replica returned error status: {0}")]
    Rpc(Status),
}

impl From<Status> for ReplicaCallError {
    fn from(status: Status) -> Self {
        match status.code() {
            // A replica killed mid-call surfaces as one of these.
            Code::Unavailable | Code::Unknown | Code::Cancelled => {
                ReplicaCallError::Unreachable(status.message().to_string())
            }
            _ => ReplicaCallError::Rpc(status),
        }
    }
}

/// ReplicaClient talks to one replica's KeyValueStore service. It connects per call so that a
/// replica restarted on the same port is picked up without any bookkeeping.
#[derive(Clone, Debug)]
pub struct ReplicaClient {
    identity: ReplicaIdentity,
    rpc_timeout: Duration,
}

impl ReplicaClient {
    pub fn new(identity: ReplicaIdentity, rpc_timeout: Duration) -> Self {
        ReplicaClient { identity, rpc_timeout }
    }

    pub fn replica_id(&self) -> ReplicaId {
        self.identity.id()
    }

    pub async fn ping(&self) -> Result<bool, ReplicaCallError> {
        let mut client = self.connect().await?;
        let reply = Self::with_deadline(self.rpc_timeout, client.ping(ProtoEmpty {})).await?;
        Ok(reply.success)
    }

    pub async fn get_state(&self) -> Result<ReplicaStateView, ReplicaCallError> {
        let mut client = self.connect().await?;
        let reply = Self::with_deadline(self.rpc_timeout, client.get_state(ProtoEmpty {})).await?;
        Ok(ReplicaStateView {
            term: Term::new(reply.term),
            is_leader: reply.is_leader,
        })
    }

    /// Get/Put may block on a commit, so they take their own deadline.
    pub async fn get(
        &self,
        key: String,
        request: ClientRequestKey,
        deadline: Duration,
    ) -> Result<ClientReply, ReplicaCallError> {
        let mut client = self.connect().await?;
        let rpc_request = ProtoGetKey {
            key,
            client_id: request.client_id,
            request_id: request.request_id,
        };
        let reply = Self::with_deadline(deadline, client.get(rpc_request)).await?;
        Ok(ClientReply::from(reply))
    }

    pub async fn put(
        &self,
        key: String,
        value: String,
        request: ClientRequestKey,
        deadline: Duration,
    ) -> Result<ClientReply, ReplicaCallError> {
        let mut client = self.connect().await?;
        let rpc_request = ProtoKeyValue {
            key,
            value,
            client_id: request.client_id,
            request_id: request.request_id,
        };
        let reply = Self::with_deadline(deadline, client.put(rpc_request)).await?;
        Ok(ClientReply::from(reply))
    }

    pub async fn assign_role(&self, assignment: RoleAssignment) -> Result<String, ReplicaCallError> {
        let mut client = self.connect().await?;
        let role = match assignment.role {
            Role::Follower => ProtoRole::Follower,
            Role::Candidate => ProtoRole::Candidate,
            Role::Leader => ProtoRole::Leader,
        };
        let rpc_request = ProtoRoleAssignment {
            term: assignment.term.as_u64(),
            role: role as i32,
            leader_hint: assignment.leader_hint.map(|id| ProtoLeaderHint {
                replica_id: id.as_u32(),
            }),
            members: assignment.members.iter().map(|id| id.as_u32()).collect(),
        };

        // A leader assignment answers after its campaign, which connects to and calls every member.
        let reply = Self::with_deadline(self.rpc_timeout * 3, client.assign_role(rpc_request)).await?;
        if reply.success {
            Ok(reply.message)
        } else {
            Err(ReplicaCallError::Rejected(reply.message))
        }
    }

    /// Poll Ping until it succeeds or `deadline` passes. Returns the last failure on expiry.
    pub async fn wait_until_reachable(&self, deadline: Duration) -> Result<(), ReplicaCallError> {
        let expiry = Instant::now() + deadline;
        loop {
            let error = match self.ping().await {
                Ok(true) => return Ok(()),
                Ok(false) => ReplicaCallError::Unreachable("Ping reported failure".into()),
                Err(e) => e,
            };

            if Instant::now() >= expiry {
                return Err(error);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn connect(&self) -> Result<KeyValueStoreClient<Channel>, ReplicaCallError> {
        let endpoint = Endpoint::from_shared(self.identity.url())
            .map_err(|e| ReplicaCallError::Unreachable(e.to_string()))?;

        match tokio::time::timeout(self.rpc_timeout, endpoint.connect()).await {
            Ok(Ok(channel)) => Ok(KeyValueStoreClient::new(channel)),
            Ok(Err(e)) => Err(ReplicaCallError::Unreachable(e.to_string())),
            Err(_) => Err(ReplicaCallError::Unreachable(format!(
                "Connecting to {} timed out",
                self.identity.url()
            ))),
        }
    }

    async fn with_deadline<T>(
        deadline: Duration,
        call: impl Future<Output = Result<Response<T>, Status>>,
    ) -> Result<T, ReplicaCallError> {
        match tokio::time::timeout(deadline, call).await {
            Ok(Ok(response)) => Ok(response.into_inner()),
            Ok(Err(status)) => Err(ReplicaCallError::from(status)),
            Err(_) => Err(ReplicaCallError::Timeout),
        }
    }
}
