use crate::cluster::ReplicaId;
use crate::consensus::{CommitStream, ConsensusEngine};
use crate::replica::applied_state::{wait_for_outcome, Admission, AppliedState, OutcomeReceiver};
use crate::replica::replica_api::{OperationError, ReplicaStateView};
use crate::replica::state_machine::{ClientRequestKey, KvCommand, KvOperation, OperationOutput};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// ReplicaAgent serves one replica's client-facing calls. Leadership is always read from the
/// consensus engine; the agent only decides whether to accept a call locally.
pub struct ReplicaAgent {
    logger: slog::Logger,
    replica_id: ReplicaId,
    engine: Arc<dyn ConsensusEngine>,
    applied_state: Arc<Mutex<AppliedState>>,
    operation_timeout: Duration,
}

impl ReplicaAgent {
    /// Create the agent and spawn the task that applies entries from `commit_stream`.
    pub fn start(
        logger: slog::Logger,
        replica_id: ReplicaId,
        engine: Arc<dyn ConsensusEngine>,
        commit_stream: CommitStream,
        operation_timeout: Duration,
    ) -> Arc<Self> {
        let applied_state = Arc::new(Mutex::new(AppliedState::new()));
        tokio::spawn(run_apply_loop(logger.clone(), commit_stream, applied_state.clone()));

        Arc::new(ReplicaAgent {
            logger,
            replica_id,
            engine,
            applied_state,
            operation_timeout,
        })
    }

    pub fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }

    pub fn ping(&self) -> bool {
        true
    }

    pub fn get_state(&self) -> ReplicaStateView {
        let state = self.engine.current_state();
        ReplicaStateView {
            term: state.term,
            is_leader: state.is_leader(),
        }
    }

    pub async fn get(&self, key: String, request: ClientRequestKey) -> Result<OperationOutput, OperationError> {
        self.execute(KvCommand {
            request,
            operation: KvOperation::Get { key },
        })
        .await
    }

    pub async fn put(
        &self,
        key: String,
        value: String,
        request: ClientRequestKey,
    ) -> Result<OperationOutput, OperationError> {
        self.execute(KvCommand {
            request,
            operation: KvOperation::Put { key, value },
        })
        .await
    }

    async fn execute(&self, command: KvCommand) -> Result<OperationOutput, OperationError> {
        self.check_leader()?;

        let request = command.request;
        let admission = self.applied_state.lock().await.admit(request);
        match admission {
            Admission::Recorded(output) => {
                slog::debug!(self.logger, "Request {:?} already applied", request);
                Ok(output)
            }
            Admission::Joined(outcome) => {
                slog::debug!(self.logger, "Request {:?} already in flight, waiting on it", request);
                match tokio::time::timeout(self.operation_timeout, wait_for_outcome(outcome)).await {
                    Ok(Some(output)) => Ok(output),
                    // The submitter gave up. Tell the caller whatever a fresh attempt would see.
                    Ok(None) => self.check_leader().and(Err(OperationError::Timeout)),
                    Err(_) => Err(OperationError::Timeout),
                }
            }
            Admission::Submit { ticket, outcome } => {
                let result =
                    tokio::time::timeout(self.operation_timeout, self.submit_and_wait(command, outcome)).await;
                let result = match result {
                    Ok(result) => result,
                    Err(_) => Err(OperationError::Timeout),
                };

                if result.is_err() {
                    self.applied_state.lock().await.abandon(&request, ticket);
                }
                result
            }
        }
    }

    fn check_leader(&self) -> Result<(), OperationError> {
        let state = self.engine.current_state();
        if state.is_leader() {
            Ok(())
        } else {
            Err(OperationError::NotLeader {
                leader_hint: state.leader_hint,
            })
        }
    }

    async fn submit_and_wait(
        &self,
        command: KvCommand,
        outcome: OutcomeReceiver,
    ) -> Result<OperationOutput, OperationError> {
        let entry_id = self.engine.submit(command.encode()?).await?;
        slog::debug!(self.logger, "Request {:?} submitted as {:?}", command.request, entry_id);

        wait_for_outcome(outcome).await.ok_or(OperationError::Timeout)
    }
}

async fn run_apply_loop(logger: slog::Logger, mut commit_stream: CommitStream, applied_state: Arc<Mutex<AppliedState>>) {
    while let Some(entry) = commit_stream.recv().await {
        let command = match KvCommand::decode(entry.data) {
            Ok(command) => command,
            Err(e) => {
                slog::error!(logger, "Skipping committed entry {:?}: {}", entry.id, e);
                continue;
            }
        };

        let request = command.request;
        let applied = applied_state.lock().await.apply_committed(command);
        if applied.duplicate {
            slog::info!(logger, "Entry {:?} repeats request {:?}, not reapplied", entry.id, request);
        }
    }

    slog::info!(logger, "Commit stream closed. Apply loop exiting.");
}
