use crate::cluster::{ReplicaIdentity, ReplicaLayout};
use crate::replica::{create_replica_node, ReplicaNodeConfig, ReplicaOptions};
use crate::server::{shutdown_signal, RpcServerShutdownHandle};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Child;
use tokio::task::JoinHandle;

/// ReplicaLauncher starts a replica for an identity. It returns once the replica has been
/// launched, not once it's serving.
pub trait ReplicaLauncher: Send + Sync + 'static {
    fn launch(&self, identity: &ReplicaIdentity) -> io::Result<Box<dyn ReplicaProcess>>;
}

#[async_trait::async_trait]
pub trait ReplicaProcess: Send + 'static {
    fn is_running(&mut self) -> bool;

    /// Stop the replica and wait for it to release its port.
    async fn terminate(&mut self);
}

/// CommandLauncher runs each replica as a child OS process of the `replica` binary.
pub struct CommandLauncher {
    logger: slog::Logger,
    program: PathBuf,
    config_path: Option<PathBuf>,
}

impl CommandLauncher {
    pub fn new(logger: slog::Logger, program: PathBuf, config_path: Option<PathBuf>) -> Self {
        CommandLauncher {
            logger,
            program,
            config_path,
        }
    }
}

impl ReplicaLauncher for CommandLauncher {
    fn launch(&self, identity: &ReplicaIdentity) -> io::Result<Box<dyn ReplicaProcess>> {
        let mut std_command = std::process::Command::new(&self.program);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_command.arg0(identity.process_label());
        }
        std_command.arg("--id").arg(identity.id().to_string());
        if let Some(config_path) = &self.config_path {
            std_command.arg("--config").arg(config_path);
        }

        let mut command = tokio::process::Command::from(std_command);
        command.stdin(Stdio::null()).kill_on_drop(true);

        let child = command.spawn()?;
        slog::info!(
            self.logger,
            "Launched {} as pid {:?}",
            identity.process_label(),
            child.id()
        );

        Ok(Box::new(ChildProcess { child }))
    }
}

struct ChildProcess {
    child: Child,
}

#[async_trait::async_trait]
impl ReplicaProcess for ChildProcess {
    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn terminate(&mut self) {
        // Fails only if it already exited.
        let _ = self.child.kill().await;
    }
}

/// InProcessLauncher runs each replica as a task on the current tokio runtime. Replicas still talk
/// gRPC on their own ports, so callers can't tell the difference.
pub struct InProcessLauncher {
    logger: slog::Logger,
    layout: ReplicaLayout,
    options: ReplicaOptions,
}

impl InProcessLauncher {
    pub fn new(logger: slog::Logger, layout: ReplicaLayout, options: ReplicaOptions) -> Self {
        InProcessLauncher {
            logger,
            layout,
            options,
        }
    }
}

impl ReplicaLauncher for InProcessLauncher {
    fn launch(&self, identity: &ReplicaIdentity) -> io::Result<Box<dyn ReplicaProcess>> {
        let node = create_replica_node(
            self.logger.clone(),
            ReplicaNodeConfig {
                identity: identity.clone(),
                layout: self.layout.clone(),
                options: self.options.clone(),
            },
        )?;

        let (shutdown_handle, signal) = shutdown_signal();
        let running = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn({
            let logger = self.logger.clone();
            let running = running.clone();
            async move {
                if let Err(e) = node.serve(signal).await {
                    slog::error!(logger, "In-process replica failed to serve: {:?}", e);
                }
                running.store(false, Ordering::SeqCst);
            }
        });

        Ok(Box::new(InProcessReplica {
            running,
            shutdown_handle: Some(shutdown_handle),
            task: Some(task),
        }))
    }
}

struct InProcessReplica {
    running: Arc<AtomicBool>,
    shutdown_handle: Option<RpcServerShutdownHandle>,
    task: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl ReplicaProcess for InProcessReplica {
    fn is_running(&mut self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn terminate(&mut self) {
        if let Some(handle) = self.shutdown_handle.take() {
            handle.shutdown();
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}
