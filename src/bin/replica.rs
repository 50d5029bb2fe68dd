//! Replica executable: one ReplicaAgent on `base_port + id`. Normally launched by the front end.
use clap::Parser;
use raft_kv::{create_replica_node, shutdown_signal, stdout_and_file_logger, ClusterConfig, ReplicaNodeConfig};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replicated key-value store replica", long_about = None)]
struct CliArgs {
    /// Replica id, in [0, active replicas).
    #[arg(long)]
    id: i64,

    /// Cluster config file. Built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();
    let config = ClusterConfig::load(args.config.as_deref())?;
    let identity = config.layout().identity(args.id)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.max_workers())
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let (logger, log_path) = stdout_and_file_logger(&config.replica_directory(identity.id()))?;
        slog::info!(logger, "Starting {} on port {}", identity.process_label(), identity.port());
        slog::info!(logger, "Logging to {:?}", log_path);

        let node = create_replica_node(
            logger.clone(),
            ReplicaNodeConfig {
                identity,
                layout: config.layout().clone(),
                options: config.replica_options(),
            },
        )?;

        let (shutdown_handle, server_shutdown_signal) = shutdown_signal();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                slog::error!(logger, "Can't listen for Ctrl-C: {}", e);
            }
            shutdown_handle.shutdown();
        });

        node.serve(server_shutdown_signal).await?;
        Ok::<(), Box<dyn Error>>(())
    })
}
