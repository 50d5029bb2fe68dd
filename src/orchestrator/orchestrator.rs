use crate::cluster::{ReplicaId, ReplicaIdentity, ReplicaLayout, ValidationError};
use crate::consensus::Term;
use crate::orchestrator::leader_cache::LeaderCache;
use crate::orchestrator::{ClientReply, ClusterConfiguration, ReplicaCallError, ReplicaClient, TIMEOUT_ERROR};
use crate::replica::ClientRequestKey;
use crate::supervisor::{ProcessSpawnError, ReplicaProcessSupervisor};
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
pub struct OrchestratorOptions {
    /// How long a replica may block a Get/Put waiting on a commit.
    pub operation_timeout: Duration,
    /// Deadline for connecting and for every other replica RPC.
    pub rpc_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Spawn(#[from] ProcessSpawnError),

    #[error("{failed} of {requested} replicas failed to start, first failure: {first_error}")]
    PartialClusterStart {
        requested: usize,
        failed: usize,
        first_error: ProcessSpawnError,
    },
}

/// ClusterOrchestrator is the front end's brain: it manages replica processes and routes client
/// operations to the current leader. It holds no authoritative state about leadership.
pub struct ClusterOrchestrator {
    logger: slog::Logger,
    layout: ReplicaLayout,
    supervisor: ReplicaProcessSupervisor,
    configuration: RwLock<ClusterConfiguration>,
    leader_cache: LeaderCache,
    options: OrchestratorOptions,
}

impl ClusterOrchestrator {
    pub fn new(
        logger: slog::Logger,
        layout: ReplicaLayout,
        supervisor: ReplicaProcessSupervisor,
        options: OrchestratorOptions,
    ) -> Self {
        ClusterOrchestrator {
            logger,
            layout,
            supervisor,
            configuration: RwLock::new(ClusterConfiguration::new()),
            leader_cache: LeaderCache::default(),
            options,
        }
    }

    pub fn layout(&self) -> &ReplicaLayout {
        &self.layout
    }

    pub async fn members(&self) -> Vec<ReplicaIdentity> {
        self.configuration.read().await.members()
    }

    /// Spawn replicas `0..size`. Every id is attempted; replicas that did start are left running
    /// even if others failed.
    pub async fn start_cluster(&self, size: i64) -> Result<Vec<ReplicaIdentity>, OrchestratorError> {
        let identities = self.layout.cluster(size)?;
        {
            let mut configuration = self.configuration.write().await;
            for identity in &identities {
                configuration.reserve(identity.clone());
            }
        }

        let mut failures = Vec::new();
        for identity in &identities {
            if let Err(e) = self.supervisor.spawn_replica(identity).await {
                failures.push(e);
            }
        }

        let failed = failures.len();
        let mut failures = failures.into_iter();
        match failures.next() {
            None => {
                slog::info!(self.logger, "Started cluster of {} replicas", identities.len());
                Ok(identities)
            }
            Some(first_error) if identities.len() == 1 => Err(OrchestratorError::Spawn(first_error)),
            Some(first_error) => Err(OrchestratorError::PartialClusterStart {
                requested: identities.len(),
                failed,
                first_error,
            }),
        }
    }

    /// (Re)start one replica on its fixed port.
    pub async fn start_replica(&self, raw_id: i64) -> Result<ReplicaIdentity, OrchestratorError> {
        let identity = self.layout.identity(raw_id)?;
        self.configuration.write().await.reserve(identity.clone());

        self.supervisor.spawn_replica(&identity).await?;
        Ok(identity)
    }

    /// Stop one replica. Its id stays in the configuration. Returns whether it was running.
    pub async fn stop_replica(&self, raw_id: i64) -> Result<bool, OrchestratorError> {
        let identity = self.layout.identity(raw_id)?;
        self.leader_cache.invalidate(identity.id()).await;

        Ok(self.supervisor.stop_replica(identity.id()).await)
    }

    pub async fn get(&self, key: String, request: ClientRequestKey) -> ClientReply {
        let deadline = self.forward_deadline();
        self.forward(request, |client| {
            let key = key.clone();
            async move { client.get(key, request, deadline).await }
        })
        .await
    }

    pub async fn put(&self, key: String, value: String, request: ClientRequestKey) -> ClientReply {
        let deadline = self.forward_deadline();
        self.forward(request, |client| {
            let key = key.clone();
            let value = value.clone();
            async move { client.put(key, value, request, deadline).await }
        })
        .await
    }

    pub async fn shutdown(&self) {
        self.supervisor.shutdown_all().await;
    }

    // A replica answers within its operation timeout; allow for the trip there and back.
    fn forward_deadline(&self) -> Duration {
        self.options.operation_timeout + self.options.rpc_timeout
    }

    async fn forward<F, Fut>(&self, request: ClientRequestKey, call: F) -> ClientReply
    where
        F: Fn(ReplicaClient) -> Fut,
        Fut: Future<Output = Result<ClientReply, ReplicaCallError>>,
    {
        let max_attempts = self.configuration.read().await.size() + 1;
        let mut hint = self.leader_cache.get().await;

        for attempt in 1..=max_attempts {
            let target = match hint.take() {
                Some(id) => id,
                None => match self.resolve_leader().await {
                    Some(id) => id,
                    None => break,
                },
            };

            let identity = match self.configuration.read().await.get(target) {
                Some(identity) => identity.clone(),
                None => {
                    slog::warn!(self.logger, "Leader hint {} is not a configured replica", target);
                    continue;
                }
            };

            match call(ReplicaClient::new(identity, self.options.rpc_timeout)).await {
                Ok(reply) if reply.wrong_leader => {
                    slog::debug!(
                        self.logger,
                        "Attempt {} for {:?}: replica {} is not leader, hint {:?}",
                        attempt,
                        request,
                        target,
                        reply.leader_hint
                    );
                    self.leader_cache.invalidate(target).await;
                    hint = reply.leader_hint.filter(|id| *id != target);
                }
                Ok(reply) => {
                    self.leader_cache.set(target).await;
                    return reply;
                }
                Err(ReplicaCallError::Timeout) => {
                    // Leader may still commit it. Caller retries with the same request id.
                    return ClientReply::failed(TIMEOUT_ERROR);
                }
                Err(e) => {
                    slog::warn!(
                        self.logger,
                        "Attempt {} for {:?}: replica {} failed: {}",
                        attempt,
                        request,
                        target,
                        e
                    );
                    self.leader_cache.invalidate(target).await;
                }
            }
        }

        ClientReply::no_leader()
    }

    /// Ask every configured replica for its state. Of those claiming leadership, the highest term
    /// wins.
    async fn resolve_leader(&self) -> Option<ReplicaId> {
        let members = self.configuration.read().await.members();
        let lookups: Vec<_> = members
            .into_iter()
            .map(|identity| {
                let client = ReplicaClient::new(identity, self.options.rpc_timeout);
                tokio::spawn(async move { (client.replica_id(), client.get_state().await) })
            })
            .collect();

        let mut leader: Option<(Term, ReplicaId)> = None;
        for lookup in lookups {
            match lookup.await {
                Ok((id, Ok(state))) if state.is_leader => {
                    if leader.map_or(true, |(term, _)| state.term > term) {
                        leader = Some((state.term, id));
                    }
                }
                Ok((id, Err(e))) => slog::debug!(self.logger, "GetState on replica {} failed: {}", id, e),
                _ => {}
            }
        }

        let leader = leader.map(|(_, id)| id);
        if let Some(id) = leader {
            self.leader_cache.set(id).await;
        }
        leader
    }
}
