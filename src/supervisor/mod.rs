mod launcher;
mod supervisor;

pub use launcher::CommandLauncher;
pub use launcher::InProcessLauncher;
pub use launcher::ReplicaLauncher;
pub use launcher::ReplicaProcess;
pub use supervisor::ProcessSpawnError;
pub use supervisor::ReplicaProcessSupervisor;
