use crate::cluster::{ReplicaIdentity, ReplicaLayout};
use crate::consensus::{create_standalone_engine, EngineController, StandaloneEngineConfig};
use crate::replica::ReplicaAgent;
use crate::server::{ReplicaRpcServer, RpcServerShutdownSignal};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// ReplicaOptions are the tunables every replica of a cluster shares.
#[derive(Clone, Debug)]
pub struct ReplicaOptions {
    /// How long a Get/Put waits for its entry to commit.
    pub operation_timeout: Duration,
    /// Deadline for each replication call to a peer.
    pub rpc_timeout: Duration,
    /// How often a leader sends AppendEntries to an idle peer.
    pub heartbeat_interval: Duration,
    pub max_workers: usize,
}

#[derive(Clone, Debug)]
pub struct ReplicaNodeConfig {
    pub identity: ReplicaIdentity,
    /// Where the replica finds the peers it may be asked to lead.
    pub layout: ReplicaLayout,
    pub options: ReplicaOptions,
}

/// ReplicaNode is one replica: a standalone consensus engine, the agent on top of it, and the
/// gRPC server exposing both.
pub struct ReplicaNode {
    logger: slog::Logger,
    config: ReplicaNodeConfig,
    agent: Arc<ReplicaAgent>,
    controller: EngineController,
}

/// Wire up a replica. Must be called within a tokio runtime.
pub fn create_replica_node(logger: slog::Logger, config: ReplicaNodeConfig) -> Result<ReplicaNode, io::Error> {
    let replica_id = config.identity.id();
    let logger = logger.new(slog::o!("ReplicaId" => replica_id.to_string()));

    let parts = create_standalone_engine(
        logger.new(slog::o!("Component" => "Engine")),
        StandaloneEngineConfig {
            replica_id,
            layout: config.layout.clone(),
            rpc_timeout: config.options.rpc_timeout,
            heartbeat_interval: config.options.heartbeat_interval,
        },
    )?;
    let agent = ReplicaAgent::start(
        logger.new(slog::o!("Component" => "Agent")),
        replica_id,
        Arc::new(parts.engine),
        parts.commit_stream,
        config.options.operation_timeout,
    );

    Ok(ReplicaNode {
        logger,
        config,
        agent,
        controller: parts.controller,
    })
}

impl ReplicaNode {
    pub fn identity(&self) -> &ReplicaIdentity {
        &self.config.identity
    }

    pub fn agent(&self) -> Arc<ReplicaAgent> {
        self.agent.clone()
    }

    pub fn controller(&self) -> EngineController {
        self.controller.clone()
    }

    /// Serve until `shutdown_signal` fires. Fails if the port can't be bound.
    pub async fn serve(self, shutdown_signal: RpcServerShutdownSignal) -> Result<(), tonic::transport::Error> {
        let server = ReplicaRpcServer::new(
            self.logger.new(slog::o!("Component" => "Server")),
            self.agent,
            Some(self.controller),
        );

        server
            .run(self.config.identity.socket_addr(), shutdown_signal, self.config.options.max_workers)
            .await
    }
}
