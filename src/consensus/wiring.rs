use crate::actor::{ActorClient, EngineActor};
use crate::cluster::{ReplicaId, ReplicaLayout};
use crate::consensus::commit_stream::create_commit_stream;
use crate::consensus::{
    state_change_listener, AppendEntriesError, AppendEntriesInput, AssignRoleError, CommitStream, ConsensusEngine,
    EngineState, EngineStateListener, EntryId, RequestVoteError, RequestVoteInput, RequestVoteOutput,
    RoleAssignment, StandaloneCore, SubmitError,
};
use bytes::Bytes;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// StandaloneEngine is the `ConsensusEngine` this crate ships with. Its leadership is decided
/// externally through an `EngineController`.
pub struct StandaloneEngine {
    actor_client: ActorClient,
    state: EngineStateListener,
}

#[async_trait::async_trait]
impl ConsensusEngine for StandaloneEngine {
    fn current_state(&self) -> EngineState {
        self.state.current()
    }

    async fn submit(&self, data: Bytes) -> Result<EntryId, SubmitError> {
        self.actor_client.submit(data).await
    }
}

/// EngineController is the external handle for deciding a standalone engine's role. The replica's
/// RPC server also uses it to hand peer traffic to the engine.
#[derive(Clone)]
pub struct EngineController {
    actor_client: ActorClient,
    state: EngineStateListener,
}

impl EngineController {
    /// Resolves once the assignment is in effect. A leader assignment with other members resolves
    /// after a majority of them accepted it, or all of them answered.
    pub async fn assign_role(&self, assignment: RoleAssignment) -> Result<EngineState, AssignRoleError> {
        self.actor_client.assign_role(assignment).await
    }

    pub fn listener(&self) -> EngineStateListener {
        self.state.clone()
    }

    pub(crate) async fn append_entries(&self, input: AppendEntriesInput) -> Result<(), AppendEntriesError> {
        self.actor_client.append_entries(input).await
    }

    pub(crate) async fn request_vote(&self, input: RequestVoteInput) -> Result<RequestVoteOutput, RequestVoteError> {
        self.actor_client.request_vote(input).await
    }
}

/// StandaloneEngineConfig is what an engine needs to know to reach the members it may lead.
#[derive(Clone, Debug)]
pub struct StandaloneEngineConfig {
    pub replica_id: ReplicaId,
    pub layout: ReplicaLayout,
    pub rpc_timeout: Duration,
    pub heartbeat_interval: Duration,
}

pub struct StandaloneEngineParts {
    pub engine: StandaloneEngine,
    pub controller: EngineController,
    pub commit_stream: CommitStream,
}

/// Create a standalone engine and spawn its event loop on the current tokio runtime. The event
/// loop exits once the engine and every controller clone are dropped.
pub fn create_standalone_engine(
    logger: slog::Logger,
    config: StandaloneEngineConfig,
) -> Result<StandaloneEngineParts, io::Error> {
    let (commit_publisher, commit_stream) = create_commit_stream();
    let (state_notifier, state_listener) = state_change_listener::new(EngineState::initial());
    let (peer_events_tx, peer_events_rx) = mpsc::unbounded_channel();

    let core = StandaloneCore::new(
        logger.clone(),
        config,
        state_notifier,
        state_listener.clone(),
        commit_publisher,
        peer_events_tx,
    )?;
    let (actor_client, actor_queue_rx) = ActorClient::new(64);
    tokio::spawn(EngineActor::new(logger, actor_queue_rx, peer_events_rx, core).run_event_loop());

    Ok(StandaloneEngineParts {
        engine: StandaloneEngine {
            actor_client: actor_client.clone(),
            state: state_listener.clone(),
        },
        controller: EngineController {
            actor_client,
            state: state_listener,
        },
        commit_stream,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{Role, Term};
    use std::net::Ipv4Addr;

    fn config() -> StandaloneEngineConfig {
        StandaloneEngineConfig {
            replica_id: ReplicaId::new(0),
            layout: ReplicaLayout::new(Ipv4Addr::LOCALHOST, 1, 3),
            rpc_timeout: Duration::from_millis(200),
            heartbeat_interval: Duration::from_millis(50),
        }
    }

    fn leader(term: u64, members: Vec<ReplicaId>) -> RoleAssignment {
        RoleAssignment {
            term: Term::new(term),
            role: Role::Leader,
            leader_hint: None,
            members,
        }
    }

    #[tokio::test]
    async fn state_reads_follow_assignments() {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let parts = create_standalone_engine(logger, config()).unwrap();
        let mut listener = parts.controller.listener();

        assert_eq!(parts.engine.current_state(), EngineState::initial());

        parts.controller.assign_role(leader(1, vec![])).await.unwrap();

        // Assignment is visible as soon as the controller call returns.
        assert!(parts.engine.current_state().is_leader());
        assert_eq!(listener.next().await.unwrap().term, Term::new(1));

        let id = parts.engine.submit(Bytes::from_static(b"op")).await.unwrap();
        let mut commit_stream = parts.commit_stream;
        assert_eq!(commit_stream.recv().await.unwrap().id, id);
    }

    #[tokio::test]
    async fn leader_assignment_waits_for_votes() {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let parts = create_standalone_engine(logger, config()).unwrap();

        // Nothing listens on the peers' ports.
        let members = vec![ReplicaId::new(0), ReplicaId::new(1), ReplicaId::new(2)];
        match parts.controller.assign_role(leader(1, members)).await {
            Err(AssignRoleError::NoQuorum { granted, members, .. }) => {
                assert_eq!(granted, 1);
                assert_eq!(members, 3);
            }
            other => panic!("Unexpected {:?}", other),
        }
        assert_eq!(parts.engine.current_state().role, Role::Candidate);
        assert!(parts.engine.submit(Bytes::from_static(b"op")).await.is_err());
    }

    #[tokio::test]
    async fn engine_exits_when_handles_dropped() {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let parts = create_standalone_engine(logger, config()).unwrap();
        let mut commit_stream = parts.commit_stream;

        drop(parts.engine);
        drop(parts.controller);

        assert!(commit_stream.recv().await.is_none());
    }
}
