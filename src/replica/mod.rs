mod agent;
mod applied_state;
mod replica_api;
mod replica_wiring;
mod state_machine;

pub use agent::ReplicaAgent;
pub use replica_api::OperationError;
pub use replica_api::ReplicaStateView;
pub use replica_wiring::create_replica_node;
pub use replica_wiring::ReplicaNode;
pub use replica_wiring::ReplicaNodeConfig;
pub use replica_wiring::ReplicaOptions;
pub use state_machine::ClientRequestKey;
pub use state_machine::OperationOutput;
