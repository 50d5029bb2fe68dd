mod frontend_server;
mod replica_server;
mod shutdown;

pub use frontend_server::FrontEndRpcServer;
pub use replica_server::ReplicaRpcServer;
pub use shutdown::shutdown_signal;
pub use shutdown::RpcServerShutdownHandle;
pub use shutdown::RpcServerShutdownSignal;
