mod client_reply;
mod configuration;
mod leader_cache;
mod orchestrator;
mod replica_client;

pub use client_reply::ClientReply;
pub use client_reply::{NO_LEADER_ERROR, TIMEOUT_ERROR};
pub use configuration::ClusterConfiguration;
pub use orchestrator::ClusterOrchestrator;
pub use orchestrator::OrchestratorError;
pub use orchestrator::OrchestratorOptions;
pub use replica_client::ReplicaCallError;
pub use replica_client::ReplicaClient;
