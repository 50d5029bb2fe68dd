//! Front end executable: serves the FrontEnd service on the control address and launches replica
//! processes on demand.
use clap::Parser;
use raft_kv::{
    shutdown_signal, stdout_logger, ClusterConfig, ClusterOrchestrator, CommandLauncher, FrontEndRpcServer,
    OrchestratorOptions, ReplicaProcessSupervisor,
};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replicated key-value store front end", long_about = None)]
struct CliArgs {
    /// Cluster config file. Built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replica executable to launch. Defaults to `replica` next to this executable.
    #[arg(long)]
    replica_binary: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();
    let config = ClusterConfig::load(args.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.max_workers())
        .enable_all()
        .build()?;

    runtime.block_on(run(args, config))
}

async fn run(args: CliArgs, config: ClusterConfig) -> Result<(), Box<dyn Error>> {
    let logger = stdout_logger().new(slog::o!("Component" => "FrontEnd"));

    let replica_binary = match args.replica_binary {
        Some(path) => path,
        None => default_replica_binary()?,
    };
    slog::info!(logger, "Replicas will be launched from {:?}", replica_binary);

    let launcher = CommandLauncher::new(logger.clone(), replica_binary, args.config);
    let supervisor = ReplicaProcessSupervisor::new(logger.clone(), Box::new(launcher));
    let orchestrator = Arc::new(ClusterOrchestrator::new(
        logger.clone(),
        config.layout().clone(),
        supervisor,
        OrchestratorOptions {
            operation_timeout: config.operation_timeout(),
            rpc_timeout: config.rpc_timeout(),
        },
    ));

    let (shutdown_handle, server_shutdown_signal) = shutdown_signal();
    tokio::spawn({
        let logger = logger.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => slog::info!(logger, "Ctrl-C received, shutting down"),
                Err(e) => slog::error!(logger, "Can't listen for Ctrl-C, shutting down: {}", e),
            }
            shutdown_handle.shutdown();
        }
    });

    let server = FrontEndRpcServer::new(logger.clone(), orchestrator.clone());
    let result = server
        .run(config.control_addr(), server_shutdown_signal, config.max_workers())
        .await;

    orchestrator.shutdown().await;
    result?;

    Ok(())
}

fn default_replica_binary() -> Result<PathBuf, io::Error> {
    let current = std::env::current_exe()?;
    Ok(current.with_file_name(format!("replica{}", std::env::consts::EXE_SUFFIX)))
}
