mod actor;
mod client;
mod cluster;
mod commitlog;
mod config;
mod consensus;
mod logging;
mod orchestrator;
mod replica;
mod server;
mod supervisor;
mod grpc {
    include!("../generated/kvraft.rs");
}

pub use client::ClientError;
pub use client::KvClient;
pub use client::RetryOptions;
pub use cluster::ReplicaId;
pub use cluster::ReplicaIdentity;
pub use cluster::ReplicaLayout;
pub use cluster::ValidationError;
pub use commitlog::Index;
pub use config::ClusterConfig;
pub use config::ClusterConfigFile;
pub use config::ConfigError;
pub use consensus::create_commit_stream;
pub use consensus::create_standalone_engine;
pub use consensus::AssignRoleError;
pub use consensus::CommitStream;
pub use consensus::CommitStreamPublisher;
pub use consensus::CommittedEntry;
pub use consensus::ConsensusEngine;
pub use consensus::EngineController;
pub use consensus::EngineState;
pub use consensus::EngineStateListener;
pub use consensus::EntryId;
pub use consensus::Role;
pub use consensus::RoleAssignment;
pub use consensus::StandaloneEngine;
pub use consensus::StandaloneEngineConfig;
pub use consensus::StandaloneEngineParts;
pub use consensus::SubmitError;
pub use consensus::Term;
pub use logging::discard_logger;
pub use logging::stdout_and_file_logger;
pub use logging::stdout_logger;
pub use orchestrator::ClientReply;
pub use orchestrator::ClusterOrchestrator;
pub use orchestrator::OrchestratorError;
pub use orchestrator::OrchestratorOptions;
pub use orchestrator::ReplicaCallError;
pub use orchestrator::ReplicaClient;
pub use orchestrator::{NO_LEADER_ERROR, TIMEOUT_ERROR};
pub use replica::create_replica_node;
pub use replica::ClientRequestKey;
pub use replica::OperationError;
pub use replica::OperationOutput;
pub use replica::ReplicaAgent;
pub use replica::ReplicaNode;
pub use replica::ReplicaNodeConfig;
pub use replica::ReplicaOptions;
pub use replica::ReplicaStateView;
pub use server::shutdown_signal;
pub use server::FrontEndRpcServer;
pub use server::ReplicaRpcServer;
pub use server::RpcServerShutdownHandle;
pub use server::RpcServerShutdownSignal;
pub use supervisor::CommandLauncher;
pub use supervisor::InProcessLauncher;
pub use supervisor::ProcessSpawnError;
pub use supervisor::ReplicaLauncher;
pub use supervisor::ReplicaProcess;
pub use supervisor::ReplicaProcessSupervisor;

// `crate::{root_mod}` holds no code, only `mod` and `pub use` statements. Sub-modules stay
// private and export through individual `pub use` lines.
